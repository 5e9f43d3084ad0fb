use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::tool_id::ToolId;

/// Lending state of a tool.
///
/// `Pending` is reserved: no transition currently enters or leaves it, but
/// records carrying it must still load and display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    #[default]
    Available,
    Borrowed,
    Pending,
}

impl ToolStatus {
    pub const ALL: [ToolStatus; 3] = [Self::Available, Self::Borrowed, Self::Pending];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Borrowed => "borrowed",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "borrowed" => Ok(Self::Borrowed),
            "pending" => Ok(Self::Pending),
            other => Err(TypeError::UnknownStatus(other.to_string())),
        }
    }
}

/// A registered tool.
///
/// `id`, `owner` and `timestamp` are fixed at creation. `status` only moves
/// through the lending state machine. `encrypted_data` is an opaque blob
/// produced by the sealing collaborator and is never parsed here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRecord {
    pub id: ToolId,
    pub name: String,
    pub description: String,
    pub owner: String,
    pub status: ToolStatus,
    pub encrypted_data: String,
    /// Creation time in seconds since the UNIX epoch.
    pub timestamp: i64,
}

impl ToolRecord {
    /// Copy of this record with a different status; every other field is kept.
    pub fn with_status(&self, status: ToolStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == ToolStatus::Available
    }

    pub fn is_borrowed(&self) -> bool {
        self.status == ToolStatus::Borrowed
    }
}

/// User-supplied data for registering a new tool.
///
/// The whole input is the payload handed to the sealing collaborator; only
/// `name` and `description` are additionally stored in clear.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInput {
    pub name: String,
    pub description: String,
    #[serde(rename = "encryptedDetails", default)]
    pub details: String,
}

impl ToolInput {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            details: String::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }
}
