//! Application layer for ToolShare.
//!
//! Ties the registry to a connected signer and reports the outcome of every
//! mutating operation through a single transaction status slot.
//!
//! - [`ToolShare`]: facade: connect, refresh, add, borrow, return
//! - [`TransactionTracker`]: pending → success|error → idle status slot
//! - [`SignerProvider`]: wallet connection and account-change notification
//! - [`AppState`]: explicit application state replaced after every relist
//! - [`AppConfig`]: TOML configuration

pub mod app;
pub mod config;
pub mod error;
pub mod signer;
pub mod state;
pub mod tracker;

pub use app::ToolShare;
pub use config::{AppConfig, LedgerConfig, TrackerConfig};
pub use error::{AppError, AppResult};
pub use signer::{SignerError, SignerProvider, StaticSigner};
pub use state::{filter_tools, AppState, ToolStats};
pub use tracker::{TransactionStatus, TransactionTracker, TxPhase};
