//! Repository trait definitions for data access abstraction.
//!
//! These traits are the storage collaborator contract. All operations
//! are async. Point lookups return `Ok(None)` when nothing matches;
//! `create` fails with [`UpmsError::DuplicateKey`] on a uniqueness
//! violation. Association operations are idempotent at the storage
//! boundary: appending an existing pair is a no-op and deleting a
//! missing pair succeeds. `replace_*` operations are atomic.
//!
//! [`UpmsError::DuplicateKey`]: crate::error::UpmsError::DuplicateKey

use uuid::Uuid;

use crate::error::UpmsResult;
use crate::models::{
    group::{CreateGroup, Group, UpdateGroup},
    resource::{CreateResource, Resource, UpdateResource},
    role::{CreateRole, Role, UpdateRole},
    user::{NewUser, UpdateUser, User},
};

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

pub trait ResourceRepository: Send + Sync {
    fn create(&self, input: CreateResource) -> impl Future<Output = UpmsResult<Resource>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = UpmsResult<Option<Resource>>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateResource,
    ) -> impl Future<Output = UpmsResult<Resource>> + Send;
    /// All resources with the given status, ordered by `sort_order`.
    fn list_by_status(&self, status: u32)
    -> impl Future<Output = UpmsResult<Vec<Resource>>> + Send;

    /// Direct children of a resource, ordered by `sort_order`.
    fn get_children(
        &self,
        parent_id: Uuid,
    ) -> impl Future<Output = UpmsResult<Vec<Resource>>> + Send;
    /// Point `child_id` at `parent_id`.
    fn attach_child(
        &self,
        parent_id: Uuid,
        child_id: Uuid,
    ) -> impl Future<Output = UpmsResult<()>> + Send;
    /// Detach `child_id` if its current parent is `parent_id`.
    fn detach_child(
        &self,
        parent_id: Uuid,
        child_id: Uuid,
    ) -> impl Future<Output = UpmsResult<()>> + Send;
    /// Detach every child of `parent_id`. The children are kept.
    fn clear_children(&self, parent_id: Uuid) -> impl Future<Output = UpmsResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = UpmsResult<Role>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = UpmsResult<Option<Role>>> + Send;
    fn update(&self, id: Uuid, input: UpdateRole)
    -> impl Future<Output = UpmsResult<Role>> + Send;
    fn list_by_status(&self, status: u32) -> impl Future<Output = UpmsResult<Vec<Role>>> + Send;

    /// Resources granted to a role.
    fn get_resources(
        &self,
        role_id: Uuid,
    ) -> impl Future<Output = UpmsResult<Vec<Resource>>> + Send;
    /// Returns `false` when the grant already existed.
    fn add_resource(
        &self,
        role_id: Uuid,
        resource_id: Uuid,
    ) -> impl Future<Output = UpmsResult<bool>> + Send;
    fn remove_resource(
        &self,
        role_id: Uuid,
        resource_id: Uuid,
    ) -> impl Future<Output = UpmsResult<()>> + Send;
    fn replace_resources(
        &self,
        role_id: Uuid,
        resource_ids: &[Uuid],
    ) -> impl Future<Output = UpmsResult<()>> + Send;
    fn clear_resources(&self, role_id: Uuid) -> impl Future<Output = UpmsResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

pub trait GroupRepository: Send + Sync {
    fn create(&self, input: CreateGroup) -> impl Future<Output = UpmsResult<Group>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = UpmsResult<Option<Group>>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateGroup,
    ) -> impl Future<Output = UpmsResult<Group>> + Send;
    fn list_by_status(&self, status: u32)
    -> impl Future<Output = UpmsResult<Vec<Group>>> + Send;
    /// Groups owned by `owner_id` with the given status.
    fn list_by_owner(
        &self,
        owner_id: Uuid,
        status: u32,
    ) -> impl Future<Output = UpmsResult<Vec<Group>>> + Send;

    /// Groups a user is a member of, oldest first.
    fn get_member_groups(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = UpmsResult<Vec<Group>>> + Send;
    /// Groups a user administers, oldest first.
    fn get_admin_groups(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = UpmsResult<Vec<Group>>> + Send;

    fn get_members(&self, group_id: Uuid) -> impl Future<Output = UpmsResult<Vec<User>>> + Send;
    /// Returns `false` when the user was already a member.
    fn add_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = UpmsResult<bool>> + Send;
    fn remove_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = UpmsResult<()>> + Send;

    fn get_admins(&self, group_id: Uuid) -> impl Future<Output = UpmsResult<Vec<User>>> + Send;
    /// Returns `false` when the user was already an admin.
    fn add_admin(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = UpmsResult<bool>> + Send;
    fn remove_admin(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = UpmsResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: NewUser) -> impl Future<Output = UpmsResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = UpmsResult<Option<User>>> + Send;
    fn get_by_name(&self, name: &str) -> impl Future<Output = UpmsResult<Option<User>>> + Send;
    fn update(&self, id: Uuid, input: UpdateUser)
    -> impl Future<Output = UpmsResult<User>> + Send;
    /// Accounts created by `owner_id`, oldest first.
    fn list_by_owner(&self, owner_id: Uuid) -> impl Future<Output = UpmsResult<Vec<User>>> + Send;

    fn get_roles(&self, user_id: Uuid) -> impl Future<Output = UpmsResult<Vec<Role>>> + Send;
    /// Returns `false` when the role was already held.
    fn add_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = UpmsResult<bool>> + Send;
    fn remove_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = UpmsResult<()>> + Send;
    fn replace_roles(
        &self,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> impl Future<Output = UpmsResult<()>> + Send;

    /// Direct resource overrides of a user.
    fn get_resources(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = UpmsResult<Vec<Resource>>> + Send;
    /// Returns `false` when the override already existed.
    fn add_resource(
        &self,
        user_id: Uuid,
        resource_id: Uuid,
    ) -> impl Future<Output = UpmsResult<bool>> + Send;
    fn remove_resource(
        &self,
        user_id: Uuid,
        resource_id: Uuid,
    ) -> impl Future<Output = UpmsResult<()>> + Send;
    fn replace_resources(
        &self,
        user_id: Uuid,
        resource_ids: &[Uuid],
    ) -> impl Future<Output = UpmsResult<()>> + Send;
}
