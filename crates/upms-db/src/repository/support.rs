//! Query helpers shared by the repositories: id parsing, existence
//! checks and association edge maintenance.
//!
//! `RELATE` requires literal record-id syntax, so edge statements embed
//! the record ids directly. Only formatted [`Uuid`] values are ever
//! embedded, never caller-supplied strings.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

/// Describes an association edge table and the tables on either side.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Edge {
    pub(crate) table: &'static str,
    pub(crate) from: &'static str,
    pub(crate) to: &'static str,
}

/// Role -> Resource.
pub(crate) const GRANTS: Edge = Edge {
    table: "grants",
    from: "role",
    to: "resource",
};

/// User -> Role.
pub(crate) const HAS_ROLE: Edge = Edge {
    table: "has_role",
    from: "user",
    to: "role",
};

/// User -> Resource.
pub(crate) const OVERRIDES: Edge = Edge {
    table: "overrides",
    from: "user",
    to: "resource",
};

/// User -> Group.
pub(crate) const ADMIN_OF: Edge = Edge {
    table: "admin_of",
    from: "user",
    to: "group",
};

/// User -> Group.
pub(crate) const MEMBER_OF: Edge = Edge {
    table: "member_of",
    from: "user",
    to: "group",
};

pub(crate) fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::InvalidRecord(format!("invalid {what} UUID: {e}")))
}

pub(crate) fn parse_opt_uuid(raw: Option<String>, what: &str) -> Result<Option<Uuid>, DbError> {
    raw.map(|s| parse_uuid(&s, what)).transpose()
}

fn first_total(rows: Vec<CountRow>) -> u64 {
    rows.first().map(|r| r.total).unwrap_or(0)
}

/// Whether a record with `id` exists in `table`.
pub(crate) async fn record_exists<C: Connection>(
    db: &Surreal<C>,
    table: &'static str,
    id: Uuid,
) -> Result<bool, DbError> {
    let query = format!(
        "SELECT count() AS total FROM {table} \
         WHERE id = type::record('{table}', $id) GROUP ALL"
    );
    let mut result = db.query(query).bind(("id", id.to_string())).await?;
    let rows: Vec<CountRow> = result.take(0)?;
    Ok(first_total(rows) > 0)
}

/// Whether any record in `table` has `field = value`.
pub(crate) async fn field_taken<C: Connection>(
    db: &Surreal<C>,
    table: &'static str,
    field: &'static str,
    value: String,
) -> Result<bool, DbError> {
    let query = format!(
        "SELECT count() AS total FROM {table} \
         WHERE {field} = $value GROUP ALL"
    );
    let mut result = db.query(query).bind(("value", value)).await?;
    let rows: Vec<CountRow> = result.take(0)?;
    Ok(first_total(rows) > 0)
}

/// Create the `from -> edge -> to` association unless it already
/// exists. Returns `false` when the pair was already present.
///
/// Both ends must exist, otherwise [`DbError::NotFound`] names the
/// missing side.
pub(crate) async fn relate_once<C: Connection>(
    db: &Surreal<C>,
    edge: Edge,
    from_id: Uuid,
    to_id: Uuid,
) -> Result<bool, DbError> {
    let Edge { table, from, to } = edge;
    let from_str = from_id.to_string();
    let to_str = to_id.to_string();

    let check = format!(
        "SELECT count() AS total FROM {from} \
         WHERE id = type::record('{from}', $from_id) GROUP ALL; \
         SELECT count() AS total FROM {to} \
         WHERE id = type::record('{to}', $to_id) GROUP ALL; \
         SELECT count() AS total FROM {table} \
         WHERE in = type::record('{from}', $from_id) \
         AND out = type::record('{to}', $to_id) GROUP ALL;"
    );
    let mut result = db
        .query(check)
        .bind(("from_id", from_str.clone()))
        .bind(("to_id", to_str.clone()))
        .await?;

    let from_rows: Vec<CountRow> = result.take(0)?;
    if first_total(from_rows) == 0 {
        return Err(DbError::NotFound {
            entity: from.into(),
            id: from_str,
        });
    }
    let to_rows: Vec<CountRow> = result.take(1)?;
    if first_total(to_rows) == 0 {
        return Err(DbError::NotFound {
            entity: to.into(),
            id: to_str,
        });
    }
    let pair_rows: Vec<CountRow> = result.take(2)?;
    if first_total(pair_rows) > 0 {
        return Ok(false);
    }

    let relate = format!("RELATE {from}:`{from_str}` -> {table} -> {to}:`{to_str}`;");
    let result = db.query(relate).await?;
    match result.check() {
        Ok(_) => Ok(true),
        // A concurrent writer won the race; the unique index kept one copy.
        Err(e) => match DbError::from_statement(table, e) {
            DbError::Duplicate { .. } => Ok(false),
            other => Err(other),
        },
    }
}

/// Delete the `from -> edge -> to` association if present.
pub(crate) async fn unrelate<C: Connection>(
    db: &Surreal<C>,
    edge: Edge,
    from_id: Uuid,
    to_id: Uuid,
) -> Result<(), DbError> {
    let Edge { table, from, to } = edge;
    let query = format!(
        "DELETE {table} WHERE \
         in = type::record('{from}', $from_id) AND \
         out = type::record('{to}', $to_id)"
    );
    db.query(query)
        .bind(("from_id", from_id.to_string()))
        .bind(("to_id", to_id.to_string()))
        .await?
        .check()
        .map_err(|e| DbError::from_statement(table, e))?;
    Ok(())
}

/// Replace every association leaving `from_id` with one edge per entry
/// of `to_ids`, in a single transaction.
pub(crate) async fn replace_relations<C: Connection>(
    db: &Surreal<C>,
    edge: Edge,
    from_id: Uuid,
    to_ids: &[Uuid],
) -> Result<(), DbError> {
    let Edge { table, from, to } = edge;
    let from_str = from_id.to_string();

    let mut query = format!(
        "BEGIN TRANSACTION; \
         DELETE {table} WHERE in = {from}:`{from_str}`; "
    );
    let mut seen = Vec::with_capacity(to_ids.len());
    for to_id in to_ids {
        if seen.contains(to_id) {
            continue;
        }
        seen.push(*to_id);
        query.push_str(&format!(
            "RELATE {from}:`{from_str}` -> {table} -> {to}:`{to_id}`; "
        ));
    }
    query.push_str("COMMIT TRANSACTION;");

    db.query(query)
        .await?
        .check()
        .map_err(|e| DbError::from_statement(table, e))?;
    Ok(())
}

/// Delete every association leaving `from_id`.
pub(crate) async fn clear_relations<C: Connection>(
    db: &Surreal<C>,
    edge: Edge,
    from_id: Uuid,
) -> Result<(), DbError> {
    let Edge { table, from, .. } = edge;
    let query = format!("DELETE {table} WHERE in = type::record('{from}', $from_id)");
    db.query(query)
        .bind(("from_id", from_id.to_string()))
        .await?
        .check()
        .map_err(|e| DbError::from_statement(table, e))?;
    Ok(())
}
