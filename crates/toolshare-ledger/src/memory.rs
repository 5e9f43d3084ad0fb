use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::receipt::CommitReceipt;
use crate::traits::LedgerClient;

/// In-memory, HashMap-based ledger.
///
/// Intended for tests and embedding. Values live behind a `RwLock` and are
/// cloned on read/write. Two switches simulate the failure modes of a real
/// contract: an availability flag and a signer that refuses every write.
pub struct InMemoryLedger {
    inner: RwLock<MemoryState>,
    available: AtomicBool,
    rejection: RwLock<Option<String>>,
}

#[derive(Default)]
struct MemoryState {
    entries: HashMap<String, Vec<u8>>,
    seq: u64,
}

impl InMemoryLedger {
    /// Create a new empty, available ledger.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryState::default()),
            available: AtomicBool::new(true),
            rejection: RwLock::new(None),
        }
    }

    /// Flip the availability probe. While unavailable, reads and writes fail
    /// with [`LedgerError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make every subsequent write fail as if the signer declined it.
    pub fn reject_writes(&self, reason: impl Into<String>) {
        if let Ok(mut rejection) = self.rejection.write() {
            *rejection = Some(reason.into());
        }
    }

    /// Undo [`reject_writes`](Self::reject_writes).
    pub fn accept_writes(&self) {
        if let Ok(mut rejection) = self.rejection.write() {
            *rejection = None;
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().map(|s| s.entries.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of writes committed so far.
    pub fn write_count(&self) -> u64 {
        self.inner.read().map(|s| s.seq).unwrap_or(0)
    }

    /// Return a sorted list of all stored keys.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .inner
            .read()
            .map(|s| s.entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    fn ensure_reachable(&self) -> LedgerResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LedgerError::Unavailable)
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn is_available(&self) -> LedgerResult<bool> {
        Ok(self.available.load(Ordering::SeqCst))
    }

    async fn get_data(&self, key: &str) -> LedgerResult<Vec<u8>> {
        self.ensure_reachable()?;
        let state = self
            .inner
            .read()
            .map_err(|e| LedgerError::Backend(format!("lock poisoned: {e}")))?;
        Ok(state.entries.get(key).cloned().unwrap_or_default())
    }

    async fn set_data(&self, key: &str, value: &[u8]) -> LedgerResult<CommitReceipt> {
        self.ensure_reachable()?;
        let rejection = self
            .rejection
            .read()
            .map_err(|e| LedgerError::Backend(format!("lock poisoned: {e}")))?
            .clone();
        if let Some(reason) = rejection {
            return Err(LedgerError::Rejected(reason));
        }

        let mut state = self
            .inner
            .write()
            .map_err(|e| LedgerError::Backend(format!("lock poisoned: {e}")))?;
        state.seq += 1;
        state.entries.insert(key.to_string(), value.to_vec());
        let receipt = CommitReceipt::new(key, state.seq, value);
        debug!(%receipt, bytes = value.len(), "committed");
        Ok(receipt)
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("key_count", &self.len())
            .field("available", &self.available.load(Ordering::SeqCst))
            .finish()
    }
}
