use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use toolshare_registry::{KeySpace, ReturnPolicy};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Top-level configuration, usually read from `toolshare.toml`.
///
/// Every section is optional; missing values fall back to the defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub return_policy: ReturnPolicy,
    pub ledger: LedgerConfig,
    pub keys: KeySpace,
    pub tracker: TrackerConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON file backing the local ledger.
    pub path: PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("toolshare-ledger.json"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub success_clear_ms: u64,
    pub error_clear_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            success_clear_ms: 2_000,
            error_clear_ms: 3_000,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> AppResult<Self> {
        toml::from_str(s).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Load from `path`, or use the defaults if the file does not exist.
    pub fn load(path: &Path) -> AppResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(s) => {
                debug!(path = %path.display(), "loading configuration");
                Self::from_toml_str(&s)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no configuration file; using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn to_toml_string(&self) -> AppResult<String> {
        toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))
    }
}
