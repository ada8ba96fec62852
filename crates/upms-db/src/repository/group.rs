//! SurrealDB implementation of [`GroupRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use upms_core::error::UpmsResult;
use upms_core::models::group::{CreateGroup, Group, UpdateGroup};
use upms_core::models::user::User;
use upms_core::repository::GroupRepository;
use uuid::Uuid;

use super::support::{ADMIN_OF, Edge, MEMBER_OF, field_taken, parse_uuid, relate_once, unrelate};
use super::user::{UserRowWithId, rows_to_users};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct GroupRow {
    name: String,
    description: String,
    owner_id: String,
    status: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct GroupRowWithId {
    record_id: String,
    name: String,
    description: String,
    owner_id: String,
    status: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GroupRow {
    fn into_group(self, id: Uuid) -> Result<Group, DbError> {
        Ok(Group {
            id,
            name: self.name,
            description: self.description,
            owner_id: parse_uuid(&self.owner_id, "owner")?,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl GroupRowWithId {
    fn try_into_group(self) -> Result<Group, DbError> {
        let id = parse_uuid(&self.record_id, "group")?;
        GroupRow {
            name: self.name,
            description: self.description,
            owner_id: self.owner_id,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_group(id)
    }
}

fn rows_to_groups(rows: Vec<GroupRowWithId>) -> Result<Vec<Group>, DbError> {
    rows.into_iter().map(GroupRowWithId::try_into_group).collect()
}

/// SurrealDB implementation of the Group repository.
#[derive(Clone)]
pub struct SurrealGroupRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGroupRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Groups on the `group` side of `edge` for `user_id`, oldest first.
    async fn groups_of(&self, edge: Edge, user_id: Uuid) -> UpmsResult<Vec<Group>> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM group \
             WHERE id IN (\
                 SELECT VALUE out FROM {} \
                 WHERE in = type::record('user', $user_id)\
             ) \
             ORDER BY created_at ASC",
            edge.table
        );
        let mut result = self
            .db
            .query(query)
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;
        rows_to_groups(rows).map_err(Into::into)
    }

    /// Users on the `user` side of `edge` for `group_id`, oldest first.
    async fn users_of(&self, edge: Edge, group_id: Uuid) -> UpmsResult<Vec<User>> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM user \
             WHERE id IN (\
                 SELECT VALUE in FROM {} \
                 WHERE out = type::record('group', $group_id)\
             ) \
             ORDER BY created_at ASC",
            edge.table
        );
        let mut result = self
            .db
            .query(query)
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        rows_to_users(rows).map_err(Into::into)
    }
}

impl<C: Connection> GroupRepository for SurrealGroupRepository<C> {
    async fn create(&self, input: CreateGroup) -> UpmsResult<Group> {
        let owner_id_str = input.owner_id.to_string();

        if field_taken(&self.db, "group", "name", input.name.clone()).await? {
            return Err(DbError::Duplicate {
                entity: "group".into(),
                field: "name".into(),
            }
            .into());
        }
        if field_taken(&self.db, "group", "owner_id", owner_id_str.clone()).await? {
            return Err(DbError::Duplicate {
                entity: "group".into(),
                field: "owner_id".into(),
            }
            .into());
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('group', $id) SET \
                 name = $name, description = $description, \
                 owner_id = $owner_id, status = 0",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("owner_id", owner_id_str))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("group", e))?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "group".into(),
            id: id_str,
        })?;

        row.into_group(id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> UpmsResult<Option<Group>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('group', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_group(id)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: Uuid, input: UpdateGroup) -> UpmsResult<Group> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('group', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("group", e))?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "group".into(),
            id: id_str,
        })?;

        row.into_group(id).map_err(Into::into)
    }

    async fn list_by_status(&self, status: u32) -> UpmsResult<Vec<Group>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM group \
                 WHERE status = $status ORDER BY created_at ASC",
            )
            .bind(("status", status))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;
        rows_to_groups(rows).map_err(Into::into)
    }

    async fn list_by_owner(&self, owner_id: Uuid, status: u32) -> UpmsResult<Vec<Group>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM group \
                 WHERE owner_id = $owner_id AND status = $status \
                 ORDER BY created_at ASC",
            )
            .bind(("owner_id", owner_id.to_string()))
            .bind(("status", status))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;
        rows_to_groups(rows).map_err(Into::into)
    }

    async fn get_member_groups(&self, user_id: Uuid) -> UpmsResult<Vec<Group>> {
        self.groups_of(MEMBER_OF, user_id).await
    }

    async fn get_admin_groups(&self, user_id: Uuid) -> UpmsResult<Vec<Group>> {
        self.groups_of(ADMIN_OF, user_id).await
    }

    async fn get_members(&self, group_id: Uuid) -> UpmsResult<Vec<User>> {
        self.users_of(MEMBER_OF, group_id).await
    }

    async fn add_member(&self, group_id: Uuid, user_id: Uuid) -> UpmsResult<bool> {
        Ok(relate_once(&self.db, MEMBER_OF, user_id, group_id).await?)
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> UpmsResult<()> {
        Ok(unrelate(&self.db, MEMBER_OF, user_id, group_id).await?)
    }

    async fn get_admins(&self, group_id: Uuid) -> UpmsResult<Vec<User>> {
        self.users_of(ADMIN_OF, group_id).await
    }

    async fn add_admin(&self, group_id: Uuid, user_id: Uuid) -> UpmsResult<bool> {
        Ok(relate_once(&self.db, ADMIN_OF, user_id, group_id).await?)
    }

    async fn remove_admin(&self, group_id: Uuid, user_id: Uuid) -> UpmsResult<()> {
        Ok(unrelate(&self.db, ADMIN_OF, user_id, group_id).await?)
    }
}
