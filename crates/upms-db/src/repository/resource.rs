//! SurrealDB implementation of [`ResourceRepository`].
//!
//! The hierarchy lives in the `parent_id` column. Cycle prevention is
//! the caller's concern; this layer only moves the pointer.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use upms_core::error::UpmsResult;
use upms_core::models::resource::{CreateResource, Resource, UpdateResource};
use upms_core::repository::ResourceRepository;
use uuid::Uuid;

use super::support::{field_taken, parse_opt_uuid, parse_uuid, record_exists};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct ResourceRow {
    name: String,
    class: String,
    attr: String,
    resource_type: u32,
    sort_order: u32,
    status: u32,
    parent_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
pub(crate) struct ResourceRowWithId {
    record_id: String,
    name: String,
    class: String,
    attr: String,
    resource_type: u32,
    sort_order: u32,
    status: u32,
    parent_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResourceRow {
    fn into_resource(self, id: Uuid) -> Result<Resource, DbError> {
        Ok(Resource {
            id,
            name: self.name,
            class: self.class,
            attr: self.attr,
            resource_type: self.resource_type,
            sort_order: self.sort_order,
            status: self.status,
            parent_id: parse_opt_uuid(self.parent_id, "parent")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ResourceRowWithId {
    pub(crate) fn try_into_resource(self) -> Result<Resource, DbError> {
        let id = parse_uuid(&self.record_id, "resource")?;
        ResourceRow {
            name: self.name,
            class: self.class,
            attr: self.attr,
            resource_type: self.resource_type,
            sort_order: self.sort_order,
            status: self.status,
            parent_id: self.parent_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_resource(id)
    }
}

pub(crate) fn rows_to_resources(rows: Vec<ResourceRowWithId>) -> Result<Vec<Resource>, DbError> {
    rows.into_iter()
        .map(ResourceRowWithId::try_into_resource)
        .collect()
}

/// SurrealDB implementation of the Resource repository.
#[derive(Clone)]
pub struct SurrealResourceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealResourceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ResourceRepository for SurrealResourceRepository<C> {
    async fn create(&self, input: CreateResource) -> UpmsResult<Resource> {
        if field_taken(&self.db, "resource", "name", input.name.clone()).await? {
            return Err(DbError::Duplicate {
                entity: "resource".into(),
                field: "name".into(),
            }
            .into());
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let parent_id_str = input.parent_id.map(|p| p.to_string());

        let result = self
            .db
            .query(
                "CREATE type::record('resource', $id) SET \
                 name = $name, class = $class, attr = $attr, \
                 resource_type = $resource_type, sort_order = $sort_order, \
                 status = $status, parent_id = $parent_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("class", input.class))
            .bind(("attr", input.attr))
            .bind(("resource_type", input.resource_type))
            .bind(("sort_order", input.sort_order))
            .bind(("status", input.status))
            .bind(("parent_id", parent_id_str))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("resource", e))?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "resource".into(),
            id: id_str,
        })?;

        row.into_resource(id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> UpmsResult<Option<Resource>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('resource', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_resource(id)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: Uuid, input: UpdateResource) -> UpmsResult<Resource> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.class.is_some() {
            sets.push("class = $class");
        }
        if input.attr.is_some() {
            sets.push("attr = $attr");
        }
        if input.resource_type.is_some() {
            sets.push("resource_type = $resource_type");
        }
        if input.sort_order.is_some() {
            sets.push("sort_order = $sort_order");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('resource', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(class) = input.class {
            builder = builder.bind(("class", class));
        }
        if let Some(attr) = input.attr {
            builder = builder.bind(("attr", attr));
        }
        if let Some(resource_type) = input.resource_type {
            builder = builder.bind(("resource_type", resource_type));
        }
        if let Some(sort_order) = input.sort_order {
            builder = builder.bind(("sort_order", sort_order));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("resource", e))?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "resource".into(),
            id: id_str,
        })?;

        row.into_resource(id).map_err(Into::into)
    }

    async fn list_by_status(&self, status: u32) -> UpmsResult<Vec<Resource>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM resource \
                 WHERE status = $status \
                 ORDER BY sort_order ASC, name ASC",
            )
            .bind(("status", status))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRowWithId> = result.take(0).map_err(DbError::from)?;
        rows_to_resources(rows).map_err(Into::into)
    }

    async fn get_children(&self, parent_id: Uuid) -> UpmsResult<Vec<Resource>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM resource \
                 WHERE parent_id = $parent_id \
                 ORDER BY sort_order ASC, name ASC",
            )
            .bind(("parent_id", parent_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRowWithId> = result.take(0).map_err(DbError::from)?;
        rows_to_resources(rows).map_err(Into::into)
    }

    async fn attach_child(&self, parent_id: Uuid, child_id: Uuid) -> UpmsResult<()> {
        if !record_exists(&self.db, "resource", parent_id).await? {
            return Err(DbError::NotFound {
                entity: "resource".into(),
                id: parent_id.to_string(),
            }
            .into());
        }

        let child_str = child_id.to_string();
        let mut result = self
            .db
            .query(
                "UPDATE type::record('resource', $id) SET \
                 parent_id = $parent_id, updated_at = time::now()",
            )
            .bind(("id", child_str.clone()))
            .bind(("parent_id", parent_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_statement("resource", e))?;

        let rows: Vec<ResourceRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "resource".into(),
                id: child_str,
            }
            .into());
        }
        Ok(())
    }

    async fn detach_child(&self, parent_id: Uuid, child_id: Uuid) -> UpmsResult<()> {
        self.db
            .query(
                "UPDATE resource SET parent_id = NONE, updated_at = time::now() \
                 WHERE id = type::record('resource', $id) \
                 AND parent_id = $parent_id",
            )
            .bind(("id", child_id.to_string()))
            .bind(("parent_id", parent_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_statement("resource", e))?;

        Ok(())
    }

    async fn clear_children(&self, parent_id: Uuid) -> UpmsResult<()> {
        self.db
            .query(
                "UPDATE resource SET parent_id = NONE, updated_at = time::now() \
                 WHERE parent_id = $parent_id",
            )
            .bind(("parent_id", parent_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_statement("resource", e))?;

        Ok(())
    }
}
