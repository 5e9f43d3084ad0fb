//! Lending state machine.
//!
//! ```text
//!   available --borrow (not owner)--> borrowed
//!   borrowed  --return (policy)-----> available
//!   pending   (reserved, no transitions)
//! ```
//!
//! Transitions are pure: they take a record and an actor and either return
//! the updated record or refuse. Nothing here touches the ledger.

use std::fmt;

use serde::{Deserialize, Serialize};
use toolshare_types::{Actor, ToolRecord, ToolStatus};

/// Who may return a borrowed tool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReturnPolicy {
    /// Only the owner confirms that a tool came back.
    #[default]
    OwnerOnly,
    /// Anyone may mark a borrowed tool as returned.
    AnyActor,
}

/// A lending action an actor can trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Borrow,
    Return,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Borrow => f.write_str("borrow"),
            Self::Return => f.write_str("return"),
        }
    }
}

/// Reasons a transition is refused.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("you cannot borrow your own tool")]
    OwnerCannotBorrow,

    #[error("tool is {0}, not available")]
    NotAvailable(ToolStatus),

    #[error("tool is {0}, not borrowed")]
    NotBorrowed(ToolStatus),

    #[error("only the owner can mark this tool as returned")]
    NotOwner,
}

/// Borrow `tool` on behalf of `actor`.
///
/// The owner is refused whatever the status; everyone else needs the tool to
/// be available.
pub fn borrow(tool: &ToolRecord, actor: &Actor) -> Result<ToolRecord, TransitionError> {
    if actor.is(&tool.owner) {
        return Err(TransitionError::OwnerCannotBorrow);
    }
    if tool.status != ToolStatus::Available {
        return Err(TransitionError::NotAvailable(tool.status));
    }
    Ok(tool.with_status(ToolStatus::Borrowed))
}

/// Return `tool` on behalf of `actor`.
pub fn return_tool(
    tool: &ToolRecord,
    actor: &Actor,
    policy: ReturnPolicy,
) -> Result<ToolRecord, TransitionError> {
    if tool.status != ToolStatus::Borrowed {
        return Err(TransitionError::NotBorrowed(tool.status));
    }
    if policy == ReturnPolicy::OwnerOnly && !actor.is(&tool.owner) {
        return Err(TransitionError::NotOwner);
    }
    Ok(tool.with_status(ToolStatus::Available))
}

/// Transitions `actor` may currently trigger on `tool`.
pub fn available_actions(tool: &ToolRecord, actor: &Actor, policy: ReturnPolicy) -> Vec<Transition> {
    let mut actions = Vec::new();
    if borrow(tool, actor).is_ok() {
        actions.push(Transition::Borrow);
    }
    if return_tool(tool, actor, policy).is_ok() {
        actions.push(Transition::Return);
    }
    actions
}
