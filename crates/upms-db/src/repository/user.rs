//! SurrealDB implementation of [`UserRepository`].
//!
//! Credentials arrive already derived; this layer never sees a raw
//! password.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use upms_core::error::UpmsResult;
use upms_core::models::resource::Resource;
use upms_core::models::role::Role;
use upms_core::models::user::{NewUser, UpdateUser, User};
use upms_core::repository::UserRepository;
use uuid::Uuid;

use super::resource::{ResourceRowWithId, rows_to_resources};
use super::role::RoleRowWithId;
use super::support::{
    HAS_ROLE, OVERRIDES, field_taken, parse_opt_uuid, parse_uuid, relate_once,
    replace_relations, unrelate,
};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    name: String,
    password_hash: String,
    salt: String,
    owner_id: Option<String>,
    code: Option<String>,
    locked: bool,
    lock_ip: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
pub(crate) struct UserRowWithId {
    record_id: String,
    name: String,
    password_hash: String,
    salt: String,
    owner_id: Option<String>,
    code: Option<String>,
    locked: bool,
    lock_ip: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            name: self.name,
            password_hash: self.password_hash,
            salt: self.salt,
            owner_id: parse_opt_uuid(self.owner_id, "owner")?,
            code: self.code,
            locked: self.locked,
            lock_ip: self.lock_ip,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = parse_uuid(&self.record_id, "user")?;
        UserRow {
            name: self.name,
            password_hash: self.password_hash,
            salt: self.salt,
            owner_id: self.owner_id,
            code: self.code,
            locked: self.locked,
            lock_ip: self.lock_ip,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_user(id)
    }
}

pub(crate) fn rows_to_users(rows: Vec<UserRowWithId>) -> Result<Vec<User>, DbError> {
    rows.into_iter().map(UserRowWithId::try_into_user).collect()
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: NewUser) -> UpmsResult<User> {
        if field_taken(&self.db, "user", "name", input.name.clone()).await? {
            return Err(DbError::Duplicate {
                entity: "user".into(),
                field: "name".into(),
            }
            .into());
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 name = $name, \
                 password_hash = $password_hash, salt = $salt, \
                 owner_id = $owner_id, \
                 code = NONE, locked = false, \
                 lock_ip = $lock_ip",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("password_hash", input.password_hash))
            .bind(("salt", input.salt))
            .bind(("owner_id", input.owner_id.map(|o| o.to_string())))
            .bind(("lock_ip", input.lock_ip))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("user", e))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        row.into_user(id).map_err(Into::into)
    }

    async fn get_by_id(&self, id: Uuid) -> UpmsResult<Option<User>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_user(id)?)),
            None => Ok(None),
        }
    }

    async fn get_by_name(&self, name: &str) -> UpmsResult<Option<User>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM user WHERE name = $name LIMIT 1")
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_user()?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> UpmsResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.password_hash.is_some() {
            sets.push("password_hash = $password_hash");
        }
        if input.salt.is_some() {
            sets.push("salt = $salt");
        }
        if input.code.is_some() {
            sets.push("code = $code");
        }
        if input.locked.is_some() {
            sets.push("locked = $locked");
        }
        if input.lock_ip.is_some() {
            sets.push("lock_ip = $lock_ip");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('user', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(password_hash) = input.password_hash {
            builder = builder.bind(("password_hash", password_hash));
        }
        if let Some(salt) = input.salt {
            builder = builder.bind(("salt", salt));
        }
        if let Some(code) = input.code {
            builder = builder.bind(("code", code));
        }
        if let Some(locked) = input.locked {
            builder = builder.bind(("locked", locked));
        }
        if let Some(lock_ip) = input.lock_ip {
            builder = builder.bind(("lock_ip", lock_ip));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("user", e))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        row.into_user(id).map_err(Into::into)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> UpmsResult<Vec<User>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE owner_id = $owner_id ORDER BY created_at ASC",
            )
            .bind(("owner_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        rows_to_users(rows).map_err(Into::into)
    }

    async fn get_roles(&self, user_id: Uuid) -> UpmsResult<Vec<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE id IN (\
                     SELECT VALUE out FROM has_role \
                     WHERE in = type::record('user', $user_id)\
                 ) \
                 ORDER BY created_at ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;
        let roles = rows
            .into_iter()
            .map(RoleRowWithId::try_into_role)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(roles)
    }

    async fn add_role(&self, user_id: Uuid, role_id: Uuid) -> UpmsResult<bool> {
        Ok(relate_once(&self.db, HAS_ROLE, user_id, role_id).await?)
    }

    async fn remove_role(&self, user_id: Uuid, role_id: Uuid) -> UpmsResult<()> {
        Ok(unrelate(&self.db, HAS_ROLE, user_id, role_id).await?)
    }

    async fn replace_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> UpmsResult<()> {
        Ok(replace_relations(&self.db, HAS_ROLE, user_id, role_ids).await?)
    }

    async fn get_resources(&self, user_id: Uuid) -> UpmsResult<Vec<Resource>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM resource \
                 WHERE id IN (\
                     SELECT VALUE out FROM overrides \
                     WHERE in = type::record('user', $user_id)\
                 ) \
                 ORDER BY sort_order ASC, name ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResourceRowWithId> = result.take(0).map_err(DbError::from)?;
        rows_to_resources(rows).map_err(Into::into)
    }

    async fn add_resource(&self, user_id: Uuid, resource_id: Uuid) -> UpmsResult<bool> {
        Ok(relate_once(&self.db, OVERRIDES, user_id, resource_id).await?)
    }

    async fn remove_resource(&self, user_id: Uuid, resource_id: Uuid) -> UpmsResult<()> {
        Ok(unrelate(&self.db, OVERRIDES, user_id, resource_id).await?)
    }

    async fn replace_resources(&self, user_id: Uuid, resource_ids: &[Uuid]) -> UpmsResult<()> {
        Ok(replace_relations(&self.db, OVERRIDES, user_id, resource_ids).await?)
    }
}
