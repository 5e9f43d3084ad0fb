use thiserror::Error;
use toolshare_registry::RegistryError;

use crate::signer::SignerError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("please connect a wallet first")]
    NotConnected,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("signer error: {0}")]
    Signer(#[from] SignerError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
