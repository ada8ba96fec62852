//! Authentication error types.

use thiserror::Error;
use upms_core::error::UpmsError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown name or wrong password; the two are not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("login address rejected")]
    IpRejected,

    #[error("account is locked")]
    AccountLocked,

    #[error("group is disabled")]
    GroupDisabled,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for UpmsError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => UpmsError::AuthFailed,
            AuthError::IpRejected => UpmsError::IpRejected,
            AuthError::AccountLocked => UpmsError::AccountLocked,
            AuthError::GroupDisabled => UpmsError::GroupDisabled,
            AuthError::Crypto(msg) => UpmsError::Crypto(msg),
        }
    }
}
