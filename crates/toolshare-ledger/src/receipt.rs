use std::fmt;

use serde::{Deserialize, Serialize};

/// Proof that a single-key write was committed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitReceipt {
    /// The key that was written.
    pub key: String,
    /// Ledger-wide write counter at the time of the commit (1-based, monotonic).
    pub seq: u64,
    /// BLAKE3 hash of the committed bytes.
    pub digest: [u8; 32],
}

impl CommitReceipt {
    /// Build a receipt for `value` committed under `key`.
    pub fn new(key: impl Into<String>, seq: u64, value: &[u8]) -> Self {
        Self {
            key: key.into(),
            seq,
            digest: *blake3::hash(value).as_bytes(),
        }
    }

    /// Short hex representation of the digest.
    pub fn short_digest(&self) -> String {
        hex::encode(&self.digest[..4])
    }
}

impl fmt::Display for CommitReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c#{} {} [{}]", self.seq, self.key, self.short_digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_display() {
        let receipt = CommitReceipt::new("tool_keys", 42, b"[]");
        let display = format!("{receipt}");
        assert!(display.starts_with("c#42 tool_keys ["));
        assert_eq!(receipt.short_digest().len(), 8);
    }

    #[test]
    fn digest_tracks_committed_bytes() {
        let receipt = CommitReceipt::new("k", 1, b"value");
        assert_eq!(receipt.digest, *blake3::hash(b"value").as_bytes());
        assert_ne!(receipt, CommitReceipt::new("k", 1, b"other"));
    }
}
