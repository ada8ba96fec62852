//! Error types for the UPMS system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpmsError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity} ({field})")]
    DuplicateKey { entity: String, field: String },

    /// A referenced entity (role, group, parent resource) does not resolve.
    #[error("Invalid reference: {entity} with id {id}")]
    InvalidReference { entity: String, id: String },

    /// The current password presented on a credential change is wrong.
    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Scope violation: {reason}")]
    ScopeViolation { reason: String },

    #[error("Login rejected from this address")]
    IpRejected,

    #[error("Account is locked")]
    AccountLocked,

    #[error("Group is disabled")]
    GroupDisabled,

    /// Generic login failure; never says whether the name exists.
    #[error("Invalid name or password")]
    AuthFailed,

    #[error("Resource hierarchy cycle: {0}")]
    CycleDetected(String),

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),
}

impl UpmsError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn invalid_reference(entity: &str, id: impl ToString) -> Self {
        Self::InvalidReference {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn scope(reason: impl Into<String>) -> Self {
        Self::ScopeViolation {
            reason: reason.into(),
        }
    }
}

pub type UpmsResult<T> = Result<T, UpmsError>;
