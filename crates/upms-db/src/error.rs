//! Database-specific error types and conversions.

use upms_core::error::UpmsError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Duplicate {entity}: {field}")]
    Duplicate { entity: String, field: String },

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Malformed record: {0}")]
    InvalidRecord(String),
}

impl DbError {
    /// Classify a failed statement. Unique-index violations become
    /// [`DbError::Duplicate`]; everything else is a query failure.
    pub(crate) fn from_statement(entity: &str, err: surrealdb::Error) -> Self {
        let message = err.to_string();
        if message.contains("already contains") {
            DbError::Duplicate {
                entity: entity.into(),
                field: "unique index".into(),
            }
        } else {
            DbError::Query(message)
        }
    }
}

impl From<DbError> for UpmsError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => UpmsError::NotFound { entity, id },
            DbError::Duplicate { entity, field } => UpmsError::DuplicateKey { entity, field },
            other => UpmsError::Database(other.to_string()),
        }
    }
}
