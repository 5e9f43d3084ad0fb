//! File-backed ledger.
//!
//! [`FileLedger`] keeps the whole key space in one JSON document. Values are
//! hex-encoded so arbitrary bytes survive the round trip. Each write rewrites
//! the document through a temporary sibling file followed by a rename, so a
//! crash leaves either the old or the new document on disk.
//!
//! Writers on the same path, in this process or another, take a sibling
//! `<path>.lock` file (created exclusively) around the load and store, so no
//! handle can write back a document that is missing another handle's key. A
//! lock file older than thirty seconds is assumed to be left by a crashed
//! writer and is removed.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::receipt::CommitReceipt;
use crate::traits::LedgerClient;

const LOCK_RETRY: Duration = Duration::from_millis(5);
const LOCK_TIMEOUT: Duration = Duration::from_secs(10);
const STALE_LOCK: Duration = Duration::from_secs(30);

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerDocument {
    seq: u64,
    entries: BTreeMap<String, String>,
}

/// Ledger persisted as a single JSON file.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileLedger {
    /// Open (or lazily create) the ledger at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!(path = %path.display(), "opening file ledger");
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Take the cross-handle write lock, waiting up to [`LOCK_TIMEOUT`].
    async fn lock_file(&self) -> LedgerResult<LockFile> {
        let path = self.sibling(".lock");
        let deadline = Instant::now() + LOCK_TIMEOUT;
        loop {
            let attempt = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match attempt {
                Ok(_) => return Ok(LockFile { path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if lock_is_stale(&path).await {
                        warn!(lock = %path.display(), "removing stale ledger lock");
                        let _ = tokio::fs::remove_file(&path).await;
                        continue;
                    }
                    if Instant::now() >= deadline {
                        return Err(LedgerError::Backend(format!(
                            "timed out waiting for {}",
                            path.display()
                        )));
                    }
                    tokio::time::sleep(LOCK_RETRY).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn load(&self) -> LedgerResult<LedgerDocument> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(LedgerDocument::default()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| LedgerError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LedgerDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, doc: &LedgerDocument) -> LedgerResult<()> {
        let bytes = serde_json::to_vec_pretty(doc)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let tmp = self.sibling(".tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Held while a writer owns `<path>.lock`; dropping it releases the lock.
struct LockFile {
    path: PathBuf,
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(lock = %self.path.display(), error = %e, "failed to release ledger lock");
        }
    }
}

async fn lock_is_stale(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|t| t.elapsed().ok())
        .is_some_and(|age| age > STALE_LOCK)
}

#[async_trait]
impl LedgerClient for FileLedger {
    async fn is_available(&self) -> LedgerResult<bool> {
        let parent_exists = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                tokio::fs::try_exists(parent).await?
            }
            _ => true,
        };
        Ok(parent_exists)
    }

    async fn get_data(&self, key: &str) -> LedgerResult<Vec<u8>> {
        let doc = self.load().await?;
        match doc.entries.get(key) {
            Some(encoded) => {
                hex::decode(encoded).map_err(|e| LedgerError::Serialization(e.to_string()))
            }
            None => Ok(Vec::new()),
        }
    }

    async fn set_data(&self, key: &str, value: &[u8]) -> LedgerResult<CommitReceipt> {
        if !self.is_available().await? {
            return Err(LedgerError::Unavailable);
        }
        let _guard = self.write_lock.lock().await;
        let _lock = self.lock_file().await?;
        let mut doc = self.load().await?;
        doc.seq += 1;
        doc.entries.insert(key.to_string(), hex::encode(value));
        self.store(&doc).await?;
        let receipt = CommitReceipt::new(key, doc.seq, value);
        debug!(%receipt, path = %self.path.display(), "committed");
        Ok(receipt)
    }
}
