//! Group service: ownership containers with admin and member sets.

use tracing::{debug, info, warn};
use upms_core::error::{UpmsError, UpmsResult};
use upms_core::models::STATUS_ACTIVE;
use upms_core::models::group::{CreateGroup, Group, UpdateGroup};
use upms_core::models::user::User;
use upms_core::repository::GroupRepository;
use uuid::Uuid;

#[derive(Clone)]
pub struct GroupService<G: GroupRepository> {
    repo: G,
}

impl<G: GroupRepository> GroupService<G> {
    pub fn new(repo: G) -> Self {
        Self { repo }
    }

    /// Create a group. Names are unique and each owner holds at most
    /// one group.
    pub async fn create(&self, input: CreateGroup) -> UpmsResult<Group> {
        if input.name.trim().is_empty() {
            return Err(UpmsError::Validation {
                message: "group name must not be empty".into(),
            });
        }
        let group = self.repo.create(input).await?;
        info!(
            group_id = %group.id,
            name = %group.name,
            owner_id = %group.owner_id,
            "group created"
        );
        Ok(group)
    }

    /// Returns `false` if the user already administered the group.
    pub async fn add_admin(&self, group_id: Uuid, user_id: Uuid) -> UpmsResult<bool> {
        let added = self.repo.add_admin(group_id, user_id).await?;
        debug!(group_id = %group_id, user_id = %user_id, added, "admin added");
        Ok(added)
    }

    /// Returns `false` if the user was already a member.
    pub async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> UpmsResult<bool> {
        let current = self.repo.get_member_groups(user_id).await?;
        if let Some(other) = current.iter().find(|g| g.id != group_id) {
            warn!(
                user_id = %user_id,
                group_id = %group_id,
                existing_group_id = %other.id,
                "user already belongs to another group"
            );
        }

        let added = self.repo.add_member(group_id, user_id).await?;
        debug!(group_id = %group_id, user_id = %user_id, added, "member added");
        Ok(added)
    }

    pub async fn remove_admin(&self, group_id: Uuid, user_id: Uuid) -> UpmsResult<()> {
        self.repo.remove_admin(group_id, user_id).await
    }

    pub async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> UpmsResult<()> {
        self.repo.remove_member(group_id, user_id).await
    }

    pub async fn load_admins(&self, group_id: Uuid) -> UpmsResult<Vec<User>> {
        self.repo.get_admins(group_id).await
    }

    pub async fn load_members(&self, group_id: Uuid) -> UpmsResult<Vec<User>> {
        self.repo.get_members(group_id).await
    }

    pub async fn get_by_id(&self, group_id: Uuid) -> UpmsResult<Option<Group>> {
        self.repo.get_by_id(group_id).await
    }

    /// The group `user_id` belongs to. With several memberships the
    /// oldest group wins.
    pub async fn find_by_member(&self, user_id: Uuid) -> UpmsResult<Option<Group>> {
        Ok(self.repo.get_member_groups(user_id).await?.into_iter().next())
    }

    pub async fn find_by_admin(&self, user_id: Uuid) -> UpmsResult<Vec<Group>> {
        self.repo.get_admin_groups(user_id).await
    }

    /// Active groups owned by `owner_id`.
    pub async fn find_by_owner(&self, owner_id: Uuid) -> UpmsResult<Vec<Group>> {
        self.repo.list_by_owner(owner_id, STATUS_ACTIVE).await
    }

    pub async fn list_active(&self) -> UpmsResult<Vec<Group>> {
        self.repo.list_by_status(STATUS_ACTIVE).await
    }

    pub async fn update(&self, group_id: Uuid, input: UpdateGroup) -> UpmsResult<Group> {
        let group = self.repo.update(group_id, input).await?;
        debug!(group_id = %group_id, status = group.status, "group updated");
        Ok(group)
    }
}
