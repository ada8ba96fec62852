//! Resource domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::STATUS_ACTIVE;

/// A node of the resource hierarchy. `parent_id == None` marks a root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    pub class: String,
    pub attr: String,
    pub resource_type: u32,
    pub sort_order: u32,
    pub status: u32,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateResource {
    pub name: String,
    pub class: String,
    pub attr: String,
    pub resource_type: u32,
    pub sort_order: u32,
    pub status: u32,
    pub parent_id: Option<Uuid>,
}

/// Partial update; every `Some` column is written in one statement.
///
/// The parent link is not part of this struct: it is owned by the
/// child-association operations so cycle checks cannot be bypassed.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateResource {
    pub name: Option<String>,
    pub class: Option<String>,
    pub attr: Option<String>,
    pub resource_type: Option<u32>,
    pub sort_order: Option<u32>,
    pub status: Option<u32>,
}

impl UpdateResource {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.class.is_none()
            && self.attr.is_none()
            && self.resource_type.is_none()
            && self.sort_order.is_none()
            && self.status.is_none()
    }
}

/// A single-column change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceField {
    Name(String),
    Class(String),
    Attr(String),
    Type(u32),
    Order(u32),
    Status(u32),
}

impl From<ResourceField> for UpdateResource {
    fn from(field: ResourceField) -> Self {
        let mut update = UpdateResource::default();
        match field {
            ResourceField::Name(v) => update.name = Some(v),
            ResourceField::Class(v) => update.class = Some(v),
            ResourceField::Attr(v) => update.attr = Some(v),
            ResourceField::Type(v) => update.resource_type = Some(v),
            ResourceField::Order(v) => update.sort_order = Some(v),
            ResourceField::Status(v) => update.status = Some(v),
        }
        update
    }
}
