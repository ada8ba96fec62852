//! User service: accounts, credentials, role and resource sets, and the
//! scoped provisioning operations reserved for top-level accounts.

use chrono::Utc;
use tracing::{debug, info};
use upms_auth::AuthConfig;
use upms_auth::password;
use upms_core::error::{UpmsError, UpmsResult};
use upms_core::ids::{IdSeparator, parse_id_list};
use upms_core::models::group::{CreateGroup, Group};
use upms_core::models::resource::{CreateResource, Resource};
use upms_core::models::role::{CreateRole, Role};
use upms_core::models::user::{
    CreateSubUser, CreateUser, NewUser, UpdateUser, User, lock_ip_from_input,
};
use upms_core::repository::{GroupRepository, ResourceRepository, RoleRepository, UserRepository};
use uuid::Uuid;

use crate::group::GroupService;
use crate::resource::ResourceService;
use crate::role::RoleService;

/// Account administration.
///
/// Role, resource and group references are resolved through the
/// sibling services so that every check runs against storage.
pub struct UserService<U, R, S, G>
where
    U: UserRepository,
    R: RoleRepository,
    S: ResourceRepository,
    G: GroupRepository,
{
    repo: U,
    roles: RoleService<R, S>,
    resources: ResourceService<S>,
    groups: GroupService<G>,
    config: AuthConfig,
}

impl<U, R, S, G> UserService<U, R, S, G>
where
    U: UserRepository,
    R: RoleRepository,
    S: ResourceRepository,
    G: GroupRepository,
{
    pub fn new(
        repo: U,
        roles: RoleService<R, S>,
        resources: ResourceService<S>,
        groups: GroupService<G>,
        config: AuthConfig,
    ) -> Self {
        Self {
            repo,
            roles,
            resources,
            groups,
            config,
        }
    }

    // -------------------------------------------------------------------
    // Accounts and credentials
    // -------------------------------------------------------------------

    /// Register an account without an owner.
    ///
    /// `role_ids` goes through [`Self::replace_roles`], so unknown roles
    /// are dropped. A given `group_id` must exist.
    pub async fn create_top_level(&self, input: CreateUser) -> UpmsResult<User> {
        if let Some(group_id) = input.group_id {
            self.groups
                .get_by_id(group_id)
                .await?
                .ok_or_else(|| UpmsError::invalid_reference("group", group_id))?;
        }

        let user = self
            .insert(&input.name, &input.password, &input.lock_ip, None)
            .await?;

        let roles = if input.role_ids.trim().is_empty() {
            0
        } else {
            self.replace_roles(user.id, &input.role_ids).await?.len()
        };
        if let Some(group_id) = input.group_id {
            self.groups.add_member(group_id, user.id).await?;
        }

        info!(
            user_id = %user.id,
            name = %user.name,
            roles,
            group_id = ?input.group_id,
            "top-level user created"
        );
        Ok(user)
    }

    pub fn check_password(&self, user: &User, candidate: &str) -> UpmsResult<bool> {
        Ok(password::verify_password(
            candidate,
            &user.salt,
            &user.password_hash,
            &self.config,
        )?)
    }

    /// Rotate the password. `old_password` must match; a fresh salt is
    /// generated for the new digest.
    pub async fn update_password(
        &self,
        user_id: Uuid,
        new_password: &str,
        old_password: &str,
    ) -> UpmsResult<User> {
        let user = self.require_user(user_id).await?;
        if !self.check_password(&user, old_password)? {
            info!(user_id = %user_id, "password change rejected");
            return Err(UpmsError::InvalidCredential);
        }
        if new_password.is_empty() {
            return Err(UpmsError::Validation {
                message: "password must not be empty".into(),
            });
        }

        let creds = password::derive_credentials(new_password, &self.config)?;
        let user = self
            .repo
            .update(
                user_id,
                UpdateUser {
                    password_hash: Some(creds.password_hash),
                    salt: Some(creds.salt),
                    ..Default::default()
                },
            )
            .await?;
        info!(user_id = %user_id, "password changed");
        Ok(user)
    }

    pub async fn lock(&self, user_id: Uuid) -> UpmsResult<User> {
        self.set_locked(user_id, true).await
    }

    pub async fn unlock(&self, user_id: Uuid) -> UpmsResult<User> {
        self.set_locked(user_id, false).await
    }

    /// Pin logins to `ip`. A blank string removes the pin.
    pub async fn update_lock_ip(&self, user_id: Uuid, ip: &str) -> UpmsResult<User> {
        let lock_ip = lock_ip_from_input(ip);
        let user = self
            .repo
            .update(
                user_id,
                UpdateUser {
                    lock_ip: Some(lock_ip),
                    ..Default::default()
                },
            )
            .await?;
        debug!(user_id = %user_id, lock_ip = ?user.lock_ip, "lock ip updated");
        Ok(user)
    }

    // -------------------------------------------------------------------
    // Roles
    // -------------------------------------------------------------------

    /// Returns `false` if the role was already held.
    pub async fn add_role(&self, user_id: Uuid, role_id: Uuid) -> UpmsResult<bool> {
        self.resolve_role(role_id).await?;
        let added = self.repo.add_role(user_id, role_id).await?;
        debug!(user_id = %user_id, role_id = %role_id, added, "role added");
        Ok(added)
    }

    pub async fn remove_role(&self, user_id: Uuid, role_id: Uuid) -> UpmsResult<()> {
        self.resolve_role(role_id).await?;
        self.repo.remove_role(user_id, role_id).await
    }

    /// Replace the user's roles with the whitespace-separated `ids`,
    /// dropping entries that do not parse or resolve. Returns the ids
    /// actually assigned.
    pub async fn replace_roles(&self, user_id: Uuid, ids: &str) -> UpmsResult<Vec<Uuid>> {
        self.require_user(user_id).await?;

        let mut assigned = Vec::new();
        for role_id in parse_id_list(ids, IdSeparator::Whitespace) {
            if self.roles.get_by_id(role_id).await?.is_some() {
                assigned.push(role_id);
            }
        }
        self.repo.replace_roles(user_id, &assigned).await?;

        info!(user_id = %user_id, count = assigned.len(), "roles replaced");
        Ok(assigned)
    }

    pub async fn load_roles(&self, user_id: Uuid) -> UpmsResult<Vec<Role>> {
        self.repo.get_roles(user_id).await
    }

    pub async fn role_ids(&self, user_id: Uuid) -> UpmsResult<Vec<Uuid>> {
        Ok(self.load_roles(user_id).await?.into_iter().map(|r| r.id).collect())
    }

    // -------------------------------------------------------------------
    // Direct resource overrides
    // -------------------------------------------------------------------

    /// Returns `false` if the override already existed.
    pub async fn add_resource(&self, user_id: Uuid, resource_id: Uuid) -> UpmsResult<bool> {
        self.resolve_resource(resource_id).await?;
        let added = self.repo.add_resource(user_id, resource_id).await?;
        debug!(user_id = %user_id, resource_id = %resource_id, added, "override added");
        Ok(added)
    }

    pub async fn remove_resource(&self, user_id: Uuid, resource_id: Uuid) -> UpmsResult<()> {
        self.resolve_resource(resource_id).await?;
        self.repo.remove_resource(user_id, resource_id).await
    }

    /// Replace the user's overrides with the whitespace-separated
    /// `ids`, dropping entries that do not parse or resolve.
    pub async fn replace_resources(&self, user_id: Uuid, ids: &str) -> UpmsResult<Vec<Uuid>> {
        self.require_user(user_id).await?;

        let parsed = parse_id_list(ids, IdSeparator::Whitespace);
        let assigned = self.resources.retain_existing(parsed).await?;
        self.repo.replace_resources(user_id, &assigned).await?;

        info!(user_id = %user_id, count = assigned.len(), "resource overrides replaced");
        Ok(assigned)
    }

    pub async fn load_resources(&self, user_id: Uuid) -> UpmsResult<Vec<Resource>> {
        self.repo.get_resources(user_id).await
    }

    pub async fn resource_ids(&self, user_id: Uuid) -> UpmsResult<Vec<Uuid>> {
        Ok(self
            .load_resources(user_id)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect())
    }

    /// Direct overrides followed by the grants of every active role,
    /// without duplicates.
    pub async fn effective_resource_ids(&self, user_id: Uuid) -> UpmsResult<Vec<Uuid>> {
        let mut ids = self.resource_ids(user_id).await?;
        for role in self.load_roles(user_id).await? {
            if !role.is_active() {
                continue;
            }
            for resource in self.roles.load_grants(role.id).await? {
                if !ids.contains(&resource.id) {
                    ids.push(resource.id);
                }
            }
        }
        Ok(ids)
    }

    // -------------------------------------------------------------------
    // Scoped provisioning
    // -------------------------------------------------------------------

    /// Create an account owned by `creator_id`.
    ///
    /// Only roles the creator itself holds are granted; the rest of
    /// `role_ids` is ignored. An activation code is issued when at
    /// least one role was granted.
    ///
    /// The caller, the group and the input are checked before anything
    /// is written. After the insert, the role, code and membership
    /// writes are separate statements: if one fails, the account stays
    /// behind with whatever was applied before it.
    pub async fn create_sub_user(&self, creator_id: Uuid, input: CreateSubUser) -> UpmsResult<User> {
        let creator = self.require_top_level(creator_id, "create sub-users").await?;

        let group = match input.group_id {
            Some(group_id) => {
                let group = self
                    .groups
                    .get_by_id(group_id)
                    .await?
                    .ok_or_else(|| UpmsError::invalid_reference("group", group_id))?;
                if group.owner_id != creator.id {
                    return Err(UpmsError::scope(format!(
                        "group {group_id} is not owned by {}",
                        creator.id
                    )));
                }
                Some(group)
            }
            None => None,
        };

        let mut user = self
            .insert(&input.name, &input.password, &input.lock_ip, Some(creator.id))
            .await?;

        let held = self.role_ids(creator.id).await?;
        let granted: Vec<Uuid> = parse_id_list(&input.role_ids, IdSeparator::Comma)
            .into_iter()
            .filter(|id| held.contains(id))
            .collect();

        if !granted.is_empty() {
            self.repo.replace_roles(user.id, &granted).await?;
            let code = password::activation_code(user.id, Utc::now(), &self.config);
            user = self
                .repo
                .update(
                    user.id,
                    UpdateUser {
                        code: Some(Some(code)),
                        ..Default::default()
                    },
                )
                .await?;
        }

        if let Some(group) = &group {
            self.groups.add_member(group.id, user.id).await?;
        }

        info!(
            user_id = %user.id,
            owner_id = %creator.id,
            roles = granted.len(),
            group_id = ?group.as_ref().map(|g| g.id),
            "sub-user created"
        );
        Ok(user)
    }

    /// Create the group owned by `caller_id`.
    pub async fn create_group(
        &self,
        caller_id: Uuid,
        name: &str,
        description: &str,
    ) -> UpmsResult<Group> {
        let caller = self.require_top_level(caller_id, "create groups").await?;
        self.groups
            .create(CreateGroup {
                name: name.into(),
                description: description.into(),
                owner_id: caller.id,
            })
            .await
    }

    pub async fn create_role(&self, caller_id: Uuid, input: CreateRole) -> UpmsResult<Role> {
        self.require_top_level(caller_id, "create roles").await?;
        self.roles.create(input, None).await
    }

    pub async fn create_resource(
        &self,
        caller_id: Uuid,
        input: CreateResource,
    ) -> UpmsResult<Resource> {
        self.require_top_level(caller_id, "create resources").await?;
        self.resources.create(input).await
    }

    /// Replace `target_id`'s overrides with the whitespace-separated `ids`.
    pub async fn update_resource_for_user(
        &self,
        caller_id: Uuid,
        target_id: Uuid,
        ids: &str,
    ) -> UpmsResult<Vec<Uuid>> {
        self.require_top_level(caller_id, "assign user resources").await?;
        require_ids(ids)?;
        self.replace_resources(target_id, ids).await
    }

    /// Replace `role_id`'s grants with the comma-separated `ids`.
    pub async fn update_resource_for_role(
        &self,
        caller_id: Uuid,
        role_id: Uuid,
        ids: &str,
    ) -> UpmsResult<Vec<Uuid>> {
        self.require_top_level(caller_id, "assign role resources").await?;
        require_ids(ids)?;
        self.roles.replace_grants(role_id, ids).await
    }

    // -------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------

    pub async fn get_by_id(&self, user_id: Uuid) -> UpmsResult<Option<User>> {
        self.repo.get_by_id(user_id).await
    }

    pub async fn find_by_name(&self, name: &str) -> UpmsResult<Option<User>> {
        self.repo.get_by_name(name).await
    }

    /// Accounts created by `owner_id`.
    pub async fn list_sub_users(&self, owner_id: Uuid) -> UpmsResult<Vec<User>> {
        self.repo.list_by_owner(owner_id).await
    }

    // -------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------

    async fn insert(
        &self,
        name: &str,
        password: &str,
        lock_ip: &str,
        owner_id: Option<Uuid>,
    ) -> UpmsResult<User> {
        if name.trim().is_empty() {
            return Err(UpmsError::Validation {
                message: "user name must not be empty".into(),
            });
        }
        if password.is_empty() {
            return Err(UpmsError::Validation {
                message: "password must not be empty".into(),
            });
        }

        let creds = password::derive_credentials(password, &self.config)?;
        self.repo
            .create(NewUser {
                name: name.trim().to_string(),
                password_hash: creds.password_hash,
                salt: creds.salt,
                owner_id,
                lock_ip: lock_ip_from_input(lock_ip),
            })
            .await
    }

    async fn set_locked(&self, user_id: Uuid, locked: bool) -> UpmsResult<User> {
        let user = self
            .repo
            .update(
                user_id,
                UpdateUser {
                    locked: Some(locked),
                    ..Default::default()
                },
            )
            .await?;
        info!(user_id = %user_id, locked, "lock state changed");
        Ok(user)
    }

    async fn require_user(&self, user_id: Uuid) -> UpmsResult<User> {
        self.repo
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| UpmsError::not_found("user", user_id))
    }

    async fn require_top_level(&self, caller_id: Uuid, action: &str) -> UpmsResult<User> {
        let caller = self.require_user(caller_id).await?;
        if !caller.is_top_level() {
            info!(user_id = %caller_id, action, "scope violation");
            return Err(UpmsError::scope(format!(
                "only top-level accounts may {action}"
            )));
        }
        Ok(caller)
    }

    async fn resolve_role(&self, role_id: Uuid) -> UpmsResult<Role> {
        self.roles
            .get_by_id(role_id)
            .await?
            .ok_or_else(|| UpmsError::invalid_reference("role", role_id))
    }

    async fn resolve_resource(&self, resource_id: Uuid) -> UpmsResult<Resource> {
        self.resources
            .get_by_id(resource_id)
            .await?
            .ok_or_else(|| UpmsError::invalid_reference("resource", resource_id))
    }
}

fn require_ids(ids: &str) -> UpmsResult<()> {
    if ids.trim().is_empty() {
        return Err(UpmsError::Validation {
            message: "resource id list must not be empty".into(),
        });
    }
    Ok(())
}
