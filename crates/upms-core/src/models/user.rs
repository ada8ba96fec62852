//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Hex-encoded Argon2id digest of password + salt.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    #[serde(skip_serializing, default)]
    pub salt: String,
    /// Account that created this one. `None` for top-level accounts.
    pub owner_id: Option<Uuid>,
    /// Activation code, assigned once the account holds a role.
    pub code: Option<String>,
    pub locked: bool,
    /// Only logins from this address are accepted when set.
    pub lock_ip: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Top-level accounts are the only ones allowed to provision
    /// sub-users, groups, roles and resources.
    pub fn is_top_level(&self) -> bool {
        self.owner_id.is_none()
    }
}

/// Input for registering a top-level account.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateUser {
    pub name: String,
    /// Raw password (salted and hashed before storage).
    pub password: String,
    /// Empty string means unrestricted.
    pub lock_ip: String,
    /// Whitespace-separated role ids assigned on creation.
    pub role_ids: String,
    /// Group to enroll the new account in.
    pub group_id: Option<Uuid>,
}

/// Input for a top-level account provisioning a sub-user.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateSubUser {
    pub name: String,
    pub password: String,
    /// Comma-separated role ids requested for the new account.
    pub role_ids: String,
    pub lock_ip: String,
    /// Group to enroll the new account in.
    pub group_id: Option<Uuid>,
}

/// Storage-level insert record; credentials are already derived.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub password_hash: String,
    pub salt: String,
    pub owner_id: Option<Uuid>,
    pub lock_ip: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub password_hash: Option<String>,
    pub salt: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub code: Option<Option<String>>,
    pub locked: Option<bool>,
    /// `Some(Some(ip))` = pin, `Some(None)` = unpin, `None` = no change.
    pub lock_ip: Option<Option<String>>,
}

/// Normalise a lock-IP input: blank means no pin.
pub fn lock_ip_from_input(ip: &str) -> Option<String> {
    let ip = ip.trim();
    if ip.is_empty() {
        None
    } else {
        Some(ip.to_string())
    }
}
