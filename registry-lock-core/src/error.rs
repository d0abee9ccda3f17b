//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

use crate::types::LockAction;

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Domain name not found
    #[error("Unknown domain {0}")]
    DomainNotFound(String),

    /// Domain disappeared between request and verification
    #[error("Domain {0} does not exist")]
    DomainVanished(String),

    /// Registrar not found
    #[error("Unknown registrar {0}")]
    RegistrarNotFound(String),

    /// No lock record carries this verification code
    #[error("Unknown verification code")]
    UnknownVerificationCode,

    /// No lock record carries this revision id
    #[error("Unknown revision ID {0}")]
    UnknownRevision(i64),

    /// The most recent lock record of the domain is still waiting for verification
    #[error("A pending {action} action already exists for {domain}")]
    PendingActionExists { domain: String, action: LockAction },

    /// Lock requested on a domain that already carries every lock status
    #[error("Domain {0} is already locked")]
    AlreadyLocked(String),

    /// Unlock requested on a domain without any lock status
    #[error("Domain {0} is already unlocked")]
    AlreadyUnlocked(String),

    /// Non-admin unlock with no verified lock behind it
    #[error("Cannot unlock a domain without a previously-verified lock")]
    NoVerifiedLock,

    /// Non-admin unlock whose last verified action was already an unlock
    #[error("Cannot unlock a domain multiple times")]
    AlreadyUnlockedByRequest,

    /// Non-admin unlock of a lock applied by an admin
    #[error("Non-admin user cannot unlock admin-locked domain {0}")]
    AdminLockedDomain(String),

    /// Second verification of the same record
    #[error("This lock / unlock has already been verified")]
    AlreadyVerified,

    /// Verification after the window elapsed
    #[error("The pending lock has expired; please try again")]
    LockExpired,

    /// Non-admin verification of an admin-created record
    #[error("Non-admin user cannot complete admin lock")]
    AdminVerificationRequired,

    /// Caller has no access to the registrar
    #[error("Registrar access denied: {0}")]
    RegistrarAccessDenied(String),

    /// Registry lock not enabled for the registrar or contact
    #[error("{0}")]
    RegistryLockNotAllowed(String),

    /// Wrong registry lock password
    #[error("Incorrect registry lock password for contact")]
    IncorrectPassword,

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Optimistic concurrency check failed
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Outgoing email could not be handed off
    #[error("Email error: {0}")]
    EmailError(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CoreError {
    /// Whether it is expected behavior (user input, resource does not exist, etc.) is used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added. **
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::DomainNotFound(_)
            | Self::DomainVanished(_)
            | Self::RegistrarNotFound(_)
            | Self::UnknownVerificationCode
            | Self::UnknownRevision(_)
            | Self::PendingActionExists { .. }
            | Self::AlreadyLocked(_)
            | Self::AlreadyUnlocked(_)
            | Self::NoVerifiedLock
            | Self::AlreadyUnlockedByRequest
            | Self::AdminLockedDomain(_)
            | Self::AlreadyVerified
            | Self::LockExpired
            | Self::AdminVerificationRequired
            | Self::RegistrarAccessDenied(_)
            | Self::RegistryLockNotAllowed(_)
            | Self::IncorrectPassword
            | Self::ValidationError(_) => true,
            Self::ConcurrentModification(_)
            | Self::StorageError(_)
            | Self::SerializationError(_)
            | Self::EmailError(_)
            | Self::ConfigError(_) => false,
        }
    }

    /// Whether rerunning the whole unit of work may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_action_message_names_action_and_domain() {
        let err = CoreError::PendingActionExists {
            domain: "example.tld".to_string(),
            action: LockAction::Unlock,
        };
        assert_eq!(
            err.to_string(),
            "A pending unlock action already exists for example.tld"
        );
    }

    #[test]
    fn only_conflicts_are_retryable() {
        assert!(CoreError::ConcurrentModification("x".into()).is_retryable());
        assert!(!CoreError::StorageError("x".into()).is_retryable());
        assert!(!CoreError::LockExpired.is_retryable());
    }

    #[test]
    fn user_errors_are_expected() {
        assert!(CoreError::AlreadyLocked("example.tld".into()).is_expected());
        assert!(CoreError::IncorrectPassword.is_expected());
        assert!(!CoreError::StorageError("disk".into()).is_expected());
    }
}
