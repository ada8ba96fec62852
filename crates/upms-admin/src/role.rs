//! Role service: role records and their resource grants.

use tracing::{debug, info};
use upms_core::error::{UpmsError, UpmsResult};
use upms_core::ids::{IdSeparator, parse_id_list};
use upms_core::models::STATUS_ACTIVE;
use upms_core::models::resource::Resource;
use upms_core::models::role::{CreateRole, Role, UpdateRole};
use upms_core::repository::{ResourceRepository, RoleRepository};
use uuid::Uuid;

use crate::resource::ResourceService;

/// Role administration. Grant targets are resolved through the
/// resource service.
#[derive(Clone)]
pub struct RoleService<R: RoleRepository, S: ResourceRepository> {
    repo: R,
    resources: ResourceService<S>,
}

impl<R: RoleRepository, S: ResourceRepository> RoleService<R, S> {
    pub fn new(repo: R, resources: ResourceService<S>) -> Self {
        Self { repo, resources }
    }

    /// Create a role, then grant the comma-separated `grants` if any
    /// were given.
    pub async fn create(&self, input: CreateRole, grants: Option<&str>) -> UpmsResult<Role> {
        if input.name.trim().is_empty() {
            return Err(UpmsError::Validation {
                message: "role name must not be empty".into(),
            });
        }

        let role = self.repo.create(input).await?;
        info!(role_id = %role.id, name = %role.name, "role created");

        if let Some(list) = grants.filter(|g| !g.trim().is_empty()) {
            self.replace_grants(role.id, list).await?;
        }
        Ok(role)
    }

    /// Grant `resource_id` to the role. Returns `false` if it was
    /// already granted.
    pub async fn add_grant(&self, role_id: Uuid, resource_id: Uuid) -> UpmsResult<bool> {
        self.require_resource(resource_id).await?;
        let added = self.repo.add_resource(role_id, resource_id).await?;
        debug!(role_id = %role_id, resource_id = %resource_id, added, "grant added");
        Ok(added)
    }

    pub async fn remove_grant(&self, role_id: Uuid, resource_id: Uuid) -> UpmsResult<()> {
        self.require_resource(resource_id).await?;
        self.repo.remove_resource(role_id, resource_id).await?;
        debug!(role_id = %role_id, resource_id = %resource_id, "grant removed");
        Ok(())
    }

    /// Replace the role's grants with the comma-separated `ids`.
    ///
    /// Entries that do not parse or do not name an existing resource
    /// are dropped. Returns the ids actually granted.
    pub async fn replace_grants(&self, role_id: Uuid, ids: &str) -> UpmsResult<Vec<Uuid>> {
        self.require_role(role_id).await?;

        let parsed = parse_id_list(ids, IdSeparator::Comma);
        let granted = self.resources.retain_existing(parsed).await?;
        self.repo.replace_resources(role_id, &granted).await?;

        info!(role_id = %role_id, count = granted.len(), "grants replaced");
        Ok(granted)
    }

    pub async fn clear_grants(&self, role_id: Uuid) -> UpmsResult<()> {
        self.repo.clear_resources(role_id).await
    }

    pub async fn load_grants(&self, role_id: Uuid) -> UpmsResult<Vec<Resource>> {
        self.repo.get_resources(role_id).await
    }

    pub async fn update(&self, role_id: Uuid, input: UpdateRole) -> UpmsResult<Role> {
        let role = self.repo.update(role_id, input).await?;
        debug!(role_id = %role_id, status = role.status, "role updated");
        Ok(role)
    }

    pub async fn get_by_id(&self, role_id: Uuid) -> UpmsResult<Option<Role>> {
        self.repo.get_by_id(role_id).await
    }

    pub async fn list_active(&self) -> UpmsResult<Vec<Role>> {
        self.repo.list_by_status(STATUS_ACTIVE).await
    }

    async fn require_role(&self, role_id: Uuid) -> UpmsResult<Role> {
        self.repo
            .get_by_id(role_id)
            .await?
            .ok_or_else(|| UpmsError::not_found("role", role_id))
    }

    async fn require_resource(&self, resource_id: Uuid) -> UpmsResult<()> {
        match self.resources.get_by_id(resource_id).await? {
            Some(_) => Ok(()),
            None => Err(UpmsError::not_found("resource", resource_id)),
        }
    }
}
