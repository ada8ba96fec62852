//! Authentication service: the login decision.

use tracing::{debug, info};
use upms_core::error::UpmsResult;
use upms_core::models::user::User;
use upms_core::repository::{GroupRepository, UserRepository};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub name: String,
    pub password: String,
    /// Address the request came from, compared against the account's
    /// pinned IP.
    pub ip_address: String,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<U: UserRepository, G: GroupRepository> {
    user_repo: U,
    group_repo: G,
    config: AuthConfig,
}

impl<U: UserRepository, G: GroupRepository> AuthService<U, G> {
    pub fn new(user_repo: U, group_repo: G, config: AuthConfig) -> Self {
        Self {
            user_repo,
            group_repo,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Whether `candidate` is the user's current password.
    pub fn check_password(&self, user: &User, candidate: &str) -> UpmsResult<bool> {
        Ok(password::verify_password(
            candidate,
            &user.salt,
            &user.password_hash,
            &self.config,
        )?)
    }

    /// Authenticate by name and password from `ip_address`.
    ///
    /// Checks run in a fixed order and stop at the first failure:
    /// credentials, pinned IP, account lock, group status.
    pub async fn login(&self, input: LoginInput) -> UpmsResult<User> {
        // 1. Look up user. An unknown name fails exactly like a bad password.
        let Some(user) = self.user_repo.get_by_name(&input.name).await? else {
            debug!(user = %input.name, "login rejected: unknown name");
            return Err(AuthError::InvalidCredentials.into());
        };

        // 2. Verify password.
        if !self.check_password(&user, &input.password)? {
            debug!(user = %input.name, "login rejected: bad password");
            return Err(AuthError::InvalidCredentials.into());
        }

        // 3. Pinned address.
        if let Some(pinned) = user.lock_ip.as_deref() {
            if pinned != input.ip_address {
                info!(user = %input.name, ip = %input.ip_address, "login rejected: address not allowed");
                return Err(AuthError::IpRejected.into());
            }
        }

        // 4. Account lock.
        if user.locked {
            info!(user = %input.name, "login rejected: account locked");
            return Err(AuthError::AccountLocked.into());
        }

        // 5. Group status. Ungrouped accounts pass.
        let groups = self.group_repo.get_member_groups(user.id).await?;
        if let Some(group) = groups.first() {
            if !group.is_active() {
                info!(user = %input.name, group = %group.name, "login rejected: group disabled");
                return Err(AuthError::GroupDisabled.into());
            }
        }

        info!(
            target: "upms::audit",
            user = %user.name,
            user_id = %user.id,
            ip = %input.ip_address,
            "login success"
        );

        Ok(user)
    }
}
