use serde::{Deserialize, Serialize};
use toolshare_types::ToolId;

pub const DEFAULT_INDEX_KEY: &str = "tool_keys";
pub const DEFAULT_RECORD_PREFIX: &str = "tool_";

/// Ledger key layout: one index key plus one key per tool record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeySpace {
    pub index_key: String,
    pub record_prefix: String,
}

impl KeySpace {
    /// Key holding the record for `id`, e.g. `tool_1700000000000-k3j9x0a`.
    pub fn record_key(&self, id: &ToolId) -> String {
        format!("{}{}", self.record_prefix, id)
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self {
            index_key: DEFAULT_INDEX_KEY.into(),
            record_prefix: DEFAULT_RECORD_PREFIX.into(),
        }
    }
}
