use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identity of whoever is calling into the registry.
///
/// Actors are wallet addresses as reported by the signer provider. Wallets
/// are inconsistent about checksum casing, so equality and hashing ignore
/// ASCII case while the original spelling is kept for display and storage.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    /// Create an actor, rejecting empty or blank identities.
    pub fn new(address: impl Into<String>) -> Result<Self, TypeError> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(TypeError::EmptyActor);
        }
        Ok(Self(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this actor is the identity stored in `owner`.
    pub fn is(&self, owner: &str) -> bool {
        self.0.eq_ignore_ascii_case(owner)
    }

    /// Abbreviated form for display, e.g. `0x1234...abcd`.
    pub fn short(&self) -> String {
        abbreviate(&self.0)
    }
}

/// Abbreviate a long address to its first six and last four characters.
pub fn abbreviate(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 12 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

impl PartialEq for Actor {
    fn eq(&self, other: &Self) -> bool {
        self.is(&other.0)
    }
}

impl Eq for Actor {}

impl Hash for Actor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actor({})", self.0)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Actor {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
