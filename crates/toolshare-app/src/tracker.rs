//! Transaction status slot.
//!
//! ```text
//!   idle --begin--> pending --succeed--> success --(success delay)--> idle
//!                           --fail-----> error   --(error delay)----> idle
//! ```
//!
//! There is exactly one slot. A new `begin` replaces whatever is displayed,
//! and the latest settlement wins the message when operations overlap. A
//! scheduled clear only fires if nothing touched the slot after it was
//! scheduled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::config::TrackerConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxPhase {
    #[default]
    Pending,
    Success,
    Error,
}

/// What the UI shows for the current (or most recent) operation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatus {
    pub visible: bool,
    pub status: TxPhase,
    pub message: String,
}

impl TransactionStatus {
    /// The hidden resting state.
    pub fn idle() -> Self {
        Self::default()
    }

    fn shown(status: TxPhase, message: impl Into<String>) -> Self {
        Self {
            visible: true,
            status,
            message: message.into(),
        }
    }

    pub fn is_idle(&self) -> bool {
        !self.visible
    }
}

/// Shared single-slot status tracker. Cloning yields a handle to the same slot.
#[derive(Clone)]
pub struct TransactionTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    slot: watch::Sender<TransactionStatus>,
    generation: AtomicU64,
    success_clear: Duration,
    error_clear: Duration,
}

impl TransactionTracker {
    pub fn new(config: &TrackerConfig) -> Self {
        let (slot, _) = watch::channel(TransactionStatus::idle());
        Self {
            inner: Arc::new(TrackerInner {
                slot,
                generation: AtomicU64::new(0),
                success_clear: Duration::from_millis(config.success_clear_ms),
                error_clear: Duration::from_millis(config.error_clear_ms),
            }),
        }
    }

    /// Snapshot of the slot.
    pub fn current(&self) -> TransactionStatus {
        self.inner.slot.borrow().clone()
    }

    /// Receiver notified on every change of the slot.
    pub fn subscribe(&self) -> watch::Receiver<TransactionStatus> {
        self.inner.slot.subscribe()
    }

    /// Show `message` as pending, replacing anything displayed.
    pub fn begin(&self, message: impl Into<String>) {
        self.bump();
        self.inner
            .slot
            .send_replace(TransactionStatus::shown(TxPhase::Pending, message));
    }

    /// Show a success and schedule the slot to clear.
    pub fn succeed(&self, message: impl Into<String>) {
        self.settle(TxPhase::Success, message.into(), self.inner.success_clear);
    }

    /// Show an error and schedule the slot to clear.
    pub fn fail(&self, message: impl Into<String>) {
        self.settle(TxPhase::Error, message.into(), self.inner.error_clear);
    }

    /// Hide the slot immediately.
    pub fn clear(&self) {
        self.bump();
        self.inner.slot.send_replace(TransactionStatus::idle());
    }

    fn bump(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn settle(&self, status: TxPhase, message: String, delay: Duration) {
        let generation = self.bump();
        debug!(?status, %message, "transaction settled");
        self.inner
            .slot
            .send_replace(TransactionStatus::shown(status, message));

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if inner.generation.load(Ordering::SeqCst) == generation {
                inner.slot.send_replace(TransactionStatus::idle());
            }
        });
    }
}

impl Default for TransactionTracker {
    fn default() -> Self {
        Self::new(&TrackerConfig::default())
    }
}

impl std::fmt::Debug for TransactionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionTracker")
            .field("current", &self.current())
            .finish()
    }
}
