//! Credential primitives: salts, random strings, Argon2id password
//! digests and activation codes.
//!
//! A stored credential is a pair of an alphanumeric salt and the
//! hex-encoded Argon2id digest of `pepper + password` under that salt.
//! Digests are fixed-length (64 hex characters).

use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, Utc};
use rand::distr::{Alphanumeric, SampleString};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

const DIGEST_LEN: usize = 32;

/// A freshly derived salt + digest pair, ready for storage.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub password_hash: String,
    pub salt: String,
}

/// Random string over `[0-9a-zA-Z]`.
pub fn random_string(len: usize) -> String {
    Alphanumeric.sample_string(&mut rand::rng(), len)
}

pub fn generate_salt(config: &AuthConfig) -> String {
    random_string(config.salt_length)
}

/// Hash `password` under `salt`.
pub fn hash_password(password: &str, salt: &str, config: &AuthConfig) -> Result<String, AuthError> {
    let params = Params::new(
        config.hash_memory_kib,
        config.hash_iterations,
        config.hash_parallelism,
        Some(DIGEST_LEN),
    )
    .map_err(|e| AuthError::Crypto(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let peppered: String;
    let input = match config.pepper.as_deref() {
        Some(p) => {
            peppered = format!("{p}{password}");
            peppered.as_bytes()
        }
        None => password.as_bytes(),
    };

    let mut digest = [0u8; DIGEST_LEN];
    argon2
        .hash_password_into(input, salt.as_bytes(), &mut digest)
        .map_err(|e| AuthError::Crypto(format!("password hash error: {e}")))?;

    Ok(hex::encode(digest))
}

/// Check `candidate` against a stored salt + digest pair.
///
/// Returns `Ok(false)` on mismatch. The digest comparison runs in
/// constant time.
pub fn verify_password(
    candidate: &str,
    salt: &str,
    stored_hash: &str,
    config: &AuthConfig,
) -> Result<bool, AuthError> {
    let computed = hash_password(candidate, salt, config)?;
    Ok(computed.as_bytes().ct_eq(stored_hash.as_bytes()).into())
}

/// Generate a new salt and hash `password` under it.
pub fn derive_credentials(password: &str, config: &AuthConfig) -> Result<Credentials, AuthError> {
    let salt = generate_salt(config);
    let password_hash = hash_password(password, &salt, config)?;
    Ok(Credentials {
        password_hash,
        salt,
    })
}

/// Activation code of the form `{user_id}_{unix_seconds}_{suffix}`.
pub fn activation_code(user_id: Uuid, issued_at: DateTime<Utc>, config: &AuthConfig) -> String {
    format!(
        "{user_id}_{}_{}",
        issued_at.timestamp(),
        random_string(config.activation_code_suffix_length)
    )
}
