//! Wire schema for ledger values.
//!
//! Values are UTF-8 JSON:
//!
//! - index key → `["<id>", "<id>", ...]`
//! - record key → `{"name", "description", "owner", "status", "encryptedData", "timestamp"}`
//!
//! The id is not part of the stored record; it is the suffix of the record
//! key, so [`decode_tool`] takes it as an argument.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use toolshare_types::{ToolId, ToolRecord, ToolStatus};
use tracing::warn;

/// Failure to decode a stored value.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("value is empty")]
    Empty,

    #[error("value is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolBody {
    name: String,
    description: String,
    owner: String,
    #[serde(default, deserialize_with = "lenient_status")]
    status: ToolStatus,
    #[serde(default)]
    encrypted_data: String,
    timestamp: i64,
}

/// `null`, `""` and a missing field all mean available.
fn lenient_status<'de, D>(deserializer: D) -> Result<ToolStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(ToolStatus::Available),
        Some(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

pub fn encode_tool(record: &ToolRecord) -> Result<Vec<u8>, CodecError> {
    let body = ToolBody {
        name: record.name.clone(),
        description: record.description.clone(),
        owner: record.owner.clone(),
        status: record.status,
        encrypted_data: record.encrypted_data.clone(),
        timestamp: record.timestamp,
    };
    Ok(serde_json::to_vec(&body)?)
}

/// Decode the record stored for `id`. An absent or blank `status` reads as
/// available.
pub fn decode_tool(id: &ToolId, bytes: &[u8]) -> Result<ToolRecord, CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::Empty);
    }
    let text = std::str::from_utf8(bytes)?;
    let body: ToolBody = serde_json::from_str(text)?;
    Ok(ToolRecord {
        id: id.clone(),
        name: body.name,
        description: body.description,
        owner: body.owner,
        status: body.status,
        encrypted_data: body.encrypted_data,
        timestamp: body.timestamp,
    })
}

pub fn encode_index(ids: &[ToolId]) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(ids)?)
}

/// Decode the index. Empty bytes are an empty index, not an error.
///
/// Only a value that is not a JSON array fails. Entries that are not
/// strings, or are blank, are logged and dropped one by one.
pub fn decode_index(bytes: &[u8]) -> Result<Vec<ToolId>, CodecError> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    let text = std::str::from_utf8(bytes)?;
    let raw: Vec<Value> = serde_json::from_str(text)?;
    let ids = raw
        .into_iter()
        .enumerate()
        .filter_map(|(pos, entry)| match entry {
            Value::String(s) => match ToolId::new(s) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(pos, error = %e, "dropping index entry");
                    None
                }
            },
            other => {
                warn!(pos, entry = %other, "dropping non-string index entry");
                None
            }
        })
        .collect();
    Ok(ids)
}
