//! The key index.
//!
//! One well-known ledger key holds the ordered list of every live tool id.
//! Updates are optimistic read-modify-write: read the list, append, write the
//! whole list back. The ledger has no conditional write, so two appends that
//! interleave their reads both start from the same list and the later write
//! drops the earlier id. Callers that share an [`IndexManager`] inside one
//! process serialize through [`Registry`](crate::Registry); nothing
//! coordinates separate processes.

use std::collections::HashSet;
use std::sync::Arc;

use toolshare_ledger::{CommitReceipt, LedgerClient};
use toolshare_types::ToolId;
use tracing::{debug, warn};

use crate::codec::{decode_index, encode_index};
use crate::error::{RegistryError, RegistryResult};

/// Read-modify-write accessor for the index key.
#[derive(Clone)]
pub struct IndexManager {
    ledger: Arc<dyn LedgerClient>,
    key: String,
}

impl IndexManager {
    pub fn new(ledger: Arc<dyn LedgerClient>, key: impl Into<String>) -> Self {
        Self {
            ledger,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// All indexed ids in insertion order.
    ///
    /// A missing index is empty. An index that is not a JSON array is logged
    /// and treated as empty so the registry degrades to "no tools" instead of
    /// failing. Bad entries are dropped individually and duplicate ids keep
    /// their first position.
    pub async fn list_keys(&self) -> RegistryResult<Vec<ToolId>> {
        match self.read().await {
            Err(RegistryError::Decode { source, .. }) => {
                warn!(key = %self.key, error = %source, "index is unreadable; treating as empty");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Append `id` unless it is already indexed.
    ///
    /// Returns the receipt of the index write, or `None` when `id` was
    /// already present and nothing was written. An unreadable index is an
    /// error here: writing over it would drop every id it still holds.
    pub async fn append_key(&self, id: &ToolId) -> RegistryResult<Option<CommitReceipt>> {
        let mut ids = self.read().await?;
        if ids.contains(id) {
            debug!(%id, "already indexed");
            return Ok(None);
        }
        ids.push(id.clone());

        let bytes = encode_index(&ids).map_err(|source| RegistryError::Encode {
            key: self.key.clone(),
            source,
        })?;
        let receipt = self
            .ledger
            .set_data(&self.key, &bytes)
            .await
            .map_err(|source| RegistryError::WriteFailed {
                key: self.key.clone(),
                source,
            })?;
        debug!(%id, %receipt, len = ids.len(), "indexed");
        Ok(Some(receipt))
    }

    async fn read(&self) -> RegistryResult<Vec<ToolId>> {
        let bytes = self.ledger.get_data(&self.key).await?;
        let ids = decode_index(&bytes).map_err(|source| RegistryError::Decode {
            key: self.key.clone(),
            source,
        })?;

        let mut seen = HashSet::with_capacity(ids.len());
        let total = ids.len();
        let unique: Vec<ToolId> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();
        if unique.len() != total {
            warn!(key = %self.key, dropped = total - unique.len(), "index held duplicate ids");
        }
        Ok(unique)
    }
}

impl std::fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager").field("key", &self.key).finish()
    }
}
