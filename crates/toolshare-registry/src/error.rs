use thiserror::Error;
use toolshare_ledger::LedgerError;
use toolshare_types::ToolId;

use crate::codec::CodecError;
use crate::lending::TransitionError;
use crate::seal::SealError;

/// Errors produced by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The availability probe reported the ledger as down before a write.
    #[error("ledger is unavailable")]
    Unavailable,

    /// A stored record could not be parsed.
    #[error("could not decode {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: CodecError,
    },

    /// A value could not be serialized for writing.
    #[error("could not encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: CodecError,
    },

    /// No record is stored for the requested id.
    #[error("tool not found: {0}")]
    NotFound(ToolId),

    /// The lending state machine refused the transition.
    #[error(transparent)]
    IllegalTransition(#[from] TransitionError),

    /// A ledger write failed or was declined by the signer.
    #[error("write to {key} failed: {source}")]
    WriteFailed {
        key: String,
        #[source]
        source: LedgerError,
    },

    /// A ledger read failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Required input was missing; nothing was written.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The sealing collaborator failed.
    #[error("sealing failed: {0}")]
    Seal(#[from] SealError),
}

impl RegistryError {
    /// Returns `true` if the signer declined a write.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::WriteFailed { source, .. } if source.is_rejection())
    }
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_and_decode_failures_are_named_apart() {
        let encode = RegistryError::Encode {
            key: "tool_1-a".into(),
            source: CodecError::Empty,
        };
        let decode = RegistryError::Decode {
            key: "tool_1-a".into(),
            source: CodecError::Empty,
        };
        assert_eq!(encode.to_string(), "could not encode tool_1-a: value is empty");
        assert_eq!(decode.to_string(), "could not decode tool_1-a: value is empty");
        assert!(!encode.is_rejection());
    }
}
