use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("tool id must not be empty")]
    EmptyToolId,

    #[error("actor identity must not be empty")]
    EmptyActor,

    #[error("unknown tool status: {0}")]
    UnknownStatus(String),
}
