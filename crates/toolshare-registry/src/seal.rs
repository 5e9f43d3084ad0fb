//! Sealing capability for tool payloads.
//!
//! The registry hands the full [`ToolInput`](toolshare_types::ToolInput) to a
//! [`Sealer`] and stores the returned string verbatim as `encryptedData`.
//! The registry itself never opens a blob.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

/// Errors from a sealing backend.
#[derive(Debug, thiserror::Error)]
pub enum SealError {
    #[error("payload could not be serialized: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("blob is not in a recognized format: {0}")]
    Malformed(String),
}

/// Turns a JSON payload into an opaque blob and back.
#[async_trait]
pub trait Sealer: Send + Sync {
    async fn seal(&self, payload: &Value) -> Result<String, SealError>;

    async fn open(&self, blob: &str) -> Result<Value, SealError>;
}

/// Placeholder envelope: `FHE-` followed by base64 of the JSON payload.
///
/// This offers no confidentiality. It keeps the blob format of deployments
/// that have not wired a real homomorphic backend yet.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvelopeSealer;

impl EnvelopeSealer {
    pub const PREFIX: &'static str = "FHE-";
}

#[async_trait]
impl Sealer for EnvelopeSealer {
    async fn seal(&self, payload: &Value) -> Result<String, SealError> {
        let json = serde_json::to_vec(payload)?;
        Ok(format!("{}{}", Self::PREFIX, STANDARD.encode(json)))
    }

    async fn open(&self, blob: &str) -> Result<Value, SealError> {
        let encoded = blob
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| SealError::Malformed(format!("missing {} prefix", Self::PREFIX)))?;
        let json = STANDARD
            .decode(encoded)
            .map_err(|e| SealError::Malformed(e.to_string()))?;
        Ok(serde_json::from_slice(&json)?)
    }
}
