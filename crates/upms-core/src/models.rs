//! Domain models for UPMS.
//!
//! Plain data shared by every crate. Associations (grants, role sets,
//! group rosters) are not embedded; they are loaded on demand through
//! the repository traits.

pub mod group;
pub mod resource;
pub mod role;
pub mod user;

/// Status value of an enabled entity. Anything else means disabled.
pub const STATUS_ACTIVE: u32 = 0;
