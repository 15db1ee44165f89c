//! Legacy SQLite store bootstrap.
//!
//! # Responsibility
//! - Open the legacy webform snapshot read-only.
//! - Verify the `webform_component` table shape before any lookup runs.
//! - Provide an in-memory legacy store for fixtures and tests.
//!
//! # Invariants
//! - Core never writes to a snapshot opened through [`open_legacy_db`].
//! - Lookups only run on connections that passed [`verify_legacy_schema`].

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
pub mod schema;

pub use open::{open_legacy_db, open_legacy_db_in_memory};
pub use schema::{install_legacy_schema, verify_legacy_schema};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    MissingTable(&'static str),
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::MissingTable(table) => write!(f, "legacy table `{table}` does not exist"),
            Self::MissingColumn { table, column } => {
                write!(f, "legacy table `{table}` has no column `{column}`")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::MissingTable(_) | Self::MissingColumn { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
