//! Resource tree service: CRUD, parent/child links and tree loading.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info};
use upms_core::error::{UpmsError, UpmsResult};
use upms_core::models::STATUS_ACTIVE;
use upms_core::models::resource::{CreateResource, Resource, ResourceField, UpdateResource};
use upms_core::repository::ResourceRepository;
use upms_core::tree::{self, ResourceNode};
use uuid::Uuid;

/// Resource administration over a [`ResourceRepository`].
#[derive(Clone)]
pub struct ResourceService<S: ResourceRepository> {
    repo: S,
}

impl<S: ResourceRepository> ResourceService<S> {
    pub fn new(repo: S) -> Self {
        Self { repo }
    }

    /// Create a resource. A given `parent_id` must resolve.
    pub async fn create(&self, input: CreateResource) -> UpmsResult<Resource> {
        if input.name.trim().is_empty() {
            return Err(UpmsError::Validation {
                message: "resource name must not be empty".into(),
            });
        }
        if let Some(parent_id) = input.parent_id {
            if self.repo.get_by_id(parent_id).await?.is_none() {
                return Err(UpmsError::invalid_reference("resource", parent_id));
            }
        }

        let resource = self.repo.create(input).await?;
        info!(
            resource_id = %resource.id,
            name = %resource.name,
            parent_id = ?resource.parent_id,
            "resource created"
        );
        Ok(resource)
    }

    pub async fn update_field(&self, id: Uuid, field: ResourceField) -> UpmsResult<Resource> {
        self.update_fields(id, field.into()).await
    }

    /// Write every `Some` column of `input` in one statement.
    pub async fn update_fields(&self, id: Uuid, input: UpdateResource) -> UpmsResult<Resource> {
        if input.is_empty() {
            return Err(UpmsError::Validation {
                message: "no resource columns to update".into(),
            });
        }
        let resource = self.repo.update(id, input).await?;
        debug!(resource_id = %id, "resource updated");
        Ok(resource)
    }

    /// Make `child_id` a child of `parent_id`, moving it if it already
    /// has another parent.
    ///
    /// Fails with [`UpmsError::CycleDetected`] when `child_id` is
    /// `parent_id` itself or one of its ancestors.
    pub async fn add_child(&self, parent_id: Uuid, child_id: Uuid) -> UpmsResult<()> {
        if parent_id == child_id {
            return Err(UpmsError::CycleDetected(format!(
                "resource {child_id} cannot be its own parent"
            )));
        }
        if self.repo.get_by_id(child_id).await?.is_none() {
            return Err(UpmsError::not_found("resource", child_id));
        }

        let lineage = self.ancestors(parent_id).await?;
        if lineage.iter().any(|r| r.id == child_id) {
            return Err(UpmsError::CycleDetected(format!(
                "resource {child_id} is an ancestor of {parent_id}"
            )));
        }

        self.repo.attach_child(parent_id, child_id).await?;
        debug!(parent_id = %parent_id, child_id = %child_id, "child attached");
        Ok(())
    }

    /// Detach `child_id` if `parent_id` is its current parent.
    pub async fn remove_child(&self, parent_id: Uuid, child_id: Uuid) -> UpmsResult<()> {
        self.repo.detach_child(parent_id, child_id).await
    }

    /// Detach all children of `parent_id`; the children become roots.
    pub async fn clear_children(&self, parent_id: Uuid) -> UpmsResult<()> {
        self.repo.clear_children(parent_id).await
    }

    pub async fn load_children(&self, parent_id: Uuid) -> UpmsResult<Vec<Resource>> {
        self.repo.get_children(parent_id).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> UpmsResult<Option<Resource>> {
        self.repo.get_by_id(id).await
    }

    /// Keep only the ids that name an existing resource, in order.
    pub async fn retain_existing(&self, ids: Vec<Uuid>) -> UpmsResult<Vec<Uuid>> {
        let mut existing = Vec::with_capacity(ids.len());
        for id in ids {
            if self.repo.get_by_id(id).await?.is_some() {
                existing.push(id);
            } else {
                debug!(resource_id = %id, "dropping unknown resource id");
            }
        }
        Ok(existing)
    }

    pub async fn list_active(&self) -> UpmsResult<Vec<Resource>> {
        self.repo.list_by_status(STATUS_ACTIVE).await
    }

    pub async fn list_by_status(&self, status: u32) -> UpmsResult<Vec<Resource>> {
        self.repo.list_by_status(status).await
    }

    /// Parent chain of `id`, nearest first. `id` itself is not included.
    ///
    /// Chains of any depth are followed. A parent link that leads back
    /// into the chain is reported as [`UpmsError::CycleDetected`].
    pub async fn ancestors(&self, id: Uuid) -> UpmsResult<Vec<Resource>> {
        let start = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| UpmsError::not_found("resource", id))?;

        let mut visited = HashSet::from([id]);
        let mut ancestors = Vec::new();
        let mut next = start.parent_id;

        while let Some(parent_id) = next {
            if !visited.insert(parent_id) {
                return Err(UpmsError::CycleDetected(format!(
                    "parent chain of {id} loops back to {parent_id}"
                )));
            }
            // A dangling parent link ends the chain.
            let Some(parent) = self.repo.get_by_id(parent_id).await? else {
                break;
            };
            next = parent.parent_id;
            ancestors.push(parent);
        }

        Ok(ancestors)
    }

    /// Load `root_id` and everything below it.
    pub async fn load_subtree(&self, root_id: Uuid) -> UpmsResult<ResourceNode> {
        let root = self
            .repo
            .get_by_id(root_id)
            .await?
            .ok_or_else(|| UpmsError::not_found("resource", root_id))?;

        let mut seen = HashSet::from([root_id]);
        let mut queue = VecDeque::from([root_id]);
        let mut descendants = Vec::new();

        while let Some(parent_id) = queue.pop_front() {
            for child in self.repo.get_children(parent_id).await? {
                if seen.insert(child.id) {
                    queue.push_back(child.id);
                    descendants.push(child);
                }
            }
        }

        Ok(tree::build_subtree(root, descendants))
    }

    /// All active resources arranged under their roots.
    pub async fn load_forest(&self) -> UpmsResult<Vec<ResourceNode>> {
        let resources = self.list_active().await?;
        tree::build_forest(resources)
    }
}
