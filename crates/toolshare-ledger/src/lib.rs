//! Ledger client contract for ToolShare.
//!
//! The ledger is an external key → bytes contract. This crate describes the
//! slice of it the registry consumes and ships two local backends.
//!
//! # Backends
//!
//! All backends implement the [`LedgerClient`] trait:
//!
//! - [`InMemoryLedger`] -- `HashMap`-based ledger for tests and embedding
//! - [`FileLedger`] -- JSON file on disk, used by the command-line client
//!
//! # Contract
//!
//! 1. Absent keys read as empty bytes, never as an error.
//! 2. Writes are last-write-wins per key. There is no compare-and-swap.
//! 3. A write is atomic for its own key and never across keys.
//! 4. Every successful write returns a [`CommitReceipt`].

pub mod error;
pub mod file;
pub mod memory;
pub mod receipt;
pub mod traits;

pub use error::{LedgerError, LedgerResult};
pub use file::FileLedger;
pub use memory::InMemoryLedger;
pub use receipt::CommitReceipt;
pub use traits::LedgerClient;
