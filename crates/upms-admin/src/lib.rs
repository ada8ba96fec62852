//! UPMS Admin — resource, role, group and user administration.
//!
//! Each service receives its repositories at construction time and
//! holds no other state.

pub mod group;
pub mod resource;
pub mod role;
pub mod user;

pub use group::GroupService;
pub use resource::ResourceService;
pub use role::RoleService;
pub use user::UserService;
