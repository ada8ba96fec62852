//! SurrealDB repository implementations.

mod group;
mod resource;
mod role;
mod support;
mod user;

pub use group::SurrealGroupRepository;
pub use resource::SurrealResourceRepository;
pub use role::SurrealRoleRepository;
pub use user::SurrealUserRepository;
