//! Legacy `webform_component` table shape.

use super::{DbError, DbResult};
use rusqlite::Connection;

pub const COMPONENT_TABLE: &str = "webform_component";

/// Columns read by component lookups.
pub const REQUIRED_COLUMNS: &[&str] = &["nid", "cid", "form_key", "name", "type", "extra"];

const LEGACY_SCHEMA_SQL: &str = include_str!("legacy_schema.sql");

/// Creates the legacy component table on a writable connection.
///
/// Only fixtures and tests build legacy stores; real snapshots already carry
/// the table.
pub fn install_legacy_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(LEGACY_SCHEMA_SQL)?;
    Ok(())
}

/// Checks that the component table and every required column exist.
pub fn verify_legacy_schema(conn: &Connection) -> DbResult<()> {
    if !table_exists(conn, COMPONENT_TABLE)? {
        return Err(DbError::MissingTable(COMPONENT_TABLE));
    }

    let columns = table_columns(conn, COMPONENT_TABLE)?;
    for &column in REQUIRED_COLUMNS {
        if !columns.iter().any(|name| name == column) {
            return Err(DbError::MissingColumn {
                table: COMPONENT_TABLE,
                column,
            });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}
