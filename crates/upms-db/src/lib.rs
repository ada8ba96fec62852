//! UPMS Database — SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - Implementations of the `upms-core` repository traits
//!   ([`SurrealResourceRepository`], [`SurrealRoleRepository`],
//!   [`SurrealGroupRepository`], [`SurrealUserRepository`])

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::{
    SurrealGroupRepository, SurrealResourceRepository, SurrealRoleRepository,
    SurrealUserRepository,
};
pub use schema::{run_migrations, schema_v1};
