//! Foundation types for ToolShare.
//!
//! This crate provides the record and identity types shared by every other
//! ToolShare crate.
//!
//! # Key Types
//!
//! - [`ToolRecord`]: A registered tool as persisted on the ledger
//! - [`ToolInput`]: Data supplied when registering a tool
//! - [`ToolStatus`]: Lending state of a tool
//! - [`ToolId`]: Collision-resistant tool identifier
//! - [`Actor`]: Wallet identity of the caller, compared case-insensitively

pub mod error;
pub mod identity;
pub mod tool;
pub mod tool_id;

pub use error::TypeError;
pub use identity::{abbreviate, Actor};
pub use tool::{ToolInput, ToolRecord, ToolStatus};
pub use tool_id::ToolId;
