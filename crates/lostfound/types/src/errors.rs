//! Error types for registry operations

use crate::{EscrowStatus, FoundItemId, Identity, LostItemId, ValidationError};
use serde::{Deserialize, Serialize};

/// Errors that can occur in registry operations.
///
/// Every variant is recoverable: a rejected operation leaves registry
/// state unchanged.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Validation failed: {0}")]
    Validation(ValidationError),

    #[error("Identity already registered: {0}")]
    AlreadyRegistered(Identity),

    #[error("Lost item not found: {0}")]
    LostItemNotFound(LostItemId),

    #[error("Found item not found: {0}")]
    FoundItemNotFound(FoundItemId),

    #[error("Unauthorized: {caller} may not {action}")]
    Unauthorized { caller: Identity, action: String },

    #[error("Lost item already resolved: {0}")]
    AlreadyResolved(LostItemId),

    #[error("Found item already claimed: {0}")]
    AlreadyClaimed(FoundItemId),

    #[error("No reward held in escrow for lost item {0}")]
    NoEscrow(LostItemId),

    #[error("Escrow for lost item {id} is not held (status: {status:?})")]
    AlreadyReleased { id: LostItemId, status: EscrowStatus },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl RegistryError {
    /// The externally observable error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::Validation(_) => ErrorKind::Validation,
            RegistryError::AlreadyRegistered(_) => ErrorKind::AlreadyRegistered,
            RegistryError::LostItemNotFound(_) | RegistryError::FoundItemNotFound(_) => {
                ErrorKind::NotFound
            }
            RegistryError::Unauthorized { .. } => ErrorKind::Unauthorized,
            RegistryError::AlreadyResolved(_) => ErrorKind::AlreadyResolved,
            RegistryError::AlreadyClaimed(_) => ErrorKind::AlreadyClaimed,
            RegistryError::NoEscrow(_) => ErrorKind::NoEscrow,
            RegistryError::AlreadyReleased { .. } => ErrorKind::AlreadyReleased,
            RegistryError::InvariantViolation(_) => ErrorKind::Internal,
            RegistryError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<ValidationError> for RegistryError {
    fn from(e: ValidationError) -> Self {
        RegistryError::Validation(e)
    }
}

/// Stable error kinds surfaced to external collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    #[serde(rename = "validation_error")]
    Validation,
    AlreadyRegistered,
    NotFound,
    Unauthorized,
    AlreadyResolved,
    AlreadyClaimed,
    NoEscrow,
    AlreadyReleased,
    Internal,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::AlreadyRegistered => "already_registered",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::AlreadyResolved => "already_resolved",
            ErrorKind::AlreadyClaimed => "already_claimed",
            ErrorKind::NoEscrow => "no_escrow",
            ErrorKind::AlreadyReleased => "already_released",
            ErrorKind::Internal => "internal",
            ErrorKind::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result type alias for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            RegistryError::LostItemNotFound(LostItemId::new(4)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            RegistryError::FoundItemNotFound(FoundItemId::new(4)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            RegistryError::from(ValidationError::single("phone", "bad")).kind(),
            ErrorKind::Validation
        );
        assert_eq!(ErrorKind::AlreadyResolved.as_str(), "already_resolved");
    }
}
