//! Identifier newtypes: caller identities and 1-based item ids

use crate::{RegistryError, RegistryResult, ValidationError};
use serde::{Deserialize, Serialize};

/// The external caller key used for authorization (e.g. an account address).
///
/// Surrounding whitespace is trimmed. Hex account addresses (`0x…`) are
/// case-insensitive, so they are stored in lower case.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        let raw: String = id.into();
        let trimmed = raw.trim();
        if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
            Self(trimmed.to_ascii_lowercase())
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Parse a raw caller key, rejecting empty input.
    pub fn parse(raw: &str) -> RegistryResult<Self> {
        let identity = Self::new(raw);
        if identity.0.is_empty() {
            return Err(RegistryError::Validation(ValidationError::single(
                "identity",
                "identity is required",
            )));
        }
        Ok(identity)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a lost-item report. Ids start at 1 and are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LostItemId(pub u64);

impl LostItemId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for LostItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for LostItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a found-item report. Counted independently of lost items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoundItemId(pub u64);

impl FoundItemId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for FoundItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for FoundItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
