//! UPMS Core — domain models, error taxonomy, repository traits and
//! the in-memory resource tree shared by every UPMS crate.

pub mod error;
pub mod ids;
pub mod models;
pub mod repository;
pub mod tree;

pub use error::{UpmsError, UpmsResult};
