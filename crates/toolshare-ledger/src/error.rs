/// Errors from ledger client operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The availability probe failed or the contract cannot be reached.
    #[error("ledger is unavailable")]
    Unavailable,

    /// The signer declined to authorize a write.
    #[error("user rejected transaction: {0}")]
    Rejected(String),

    /// Serialization or deserialization of backend state failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from a file-backed ledger.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure (lock poisoning, transport errors).
    #[error("backend error: {0}")]
    Backend(String),
}

impl LedgerError {
    /// Returns `true` if the signer refused the write.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
