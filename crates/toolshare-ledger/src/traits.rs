use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LedgerResult;
use crate::receipt::CommitReceipt;

/// Key-value ledger contract consumed by the registry.
///
/// All implementations must satisfy these invariants:
/// - `get_data` on a key that was never written returns empty bytes.
/// - `set_data` is last-write-wins for its key. No conditional write exists,
///   so read-modify-write sequences built on top of it can lose updates.
/// - A write either commits entirely or fails; it never spans keys.
/// - The ledger never interprets values -- it is a pure key-value store.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Liveness probe for the underlying contract.
    async fn is_available(&self) -> LedgerResult<bool>;

    /// Read the value stored under `key`, or empty bytes if absent.
    async fn get_data(&self, key: &str) -> LedgerResult<Vec<u8>>;

    /// Overwrite the value stored under `key`.
    async fn set_data(&self, key: &str, value: &[u8]) -> LedgerResult<CommitReceipt>;
}

#[async_trait]
impl<T: LedgerClient + ?Sized> LedgerClient for Arc<T> {
    async fn is_available(&self) -> LedgerResult<bool> {
        (**self).is_available().await
    }

    async fn get_data(&self, key: &str) -> LedgerResult<Vec<u8>> {
        (**self).get_data(key).await
    }

    async fn set_data(&self, key: &str, value: &[u8]) -> LedgerResult<CommitReceipt> {
        (**self).set_data(key, value).await
    }
}
