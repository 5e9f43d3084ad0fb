//! Tool registry for ToolShare.
//!
//! The ledger only knows single keys holding single values. This crate
//! builds a registry on top of it:
//!
//! - [`codec`]: JSON wire schema for tool records and the key index
//! - [`index`]: [`IndexManager`], the read-modify-write list of live ids
//! - [`registry`]: [`Registry`], entity-level create/list/get/borrow/return
//! - [`lending`]: pure lending state machine and the return policy
//! - [`seal`]: pluggable [`Sealer`] producing the opaque `encryptedData` blob
//! - [`clock`]: wall-clock abstraction used for ids and timestamps
//!
//! # Consistency
//!
//! There are no cross-key transactions. A new tool is written in two steps:
//! the record first, then its id is appended to the index. A crash between
//! the steps leaves an orphan record that is never listed, but the index
//! never names a record that does not exist. Index appends from separate
//! processes can still race, and the later write wins.

pub mod clock;
pub mod codec;
pub mod error;
pub mod index;
pub mod keys;
pub mod lending;
pub mod registry;
pub mod seal;

pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{decode_index, decode_tool, encode_index, encode_tool, CodecError};
pub use error::{RegistryError, RegistryResult};
pub use index::IndexManager;
pub use keys::KeySpace;
pub use lending::{available_actions, borrow, return_tool, ReturnPolicy, Transition, TransitionError};
pub use registry::Registry;
pub use seal::{EnvelopeSealer, SealError, Sealer};
