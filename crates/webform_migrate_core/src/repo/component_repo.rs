//! Legacy component lookup contracts and implementations.
//!
//! # Responsibility
//! - Expose the legacy store as one read-only equality lookup.
//! - Keep SQL details behind the repository boundary.
//!
//! # Invariants
//! - Lookups match `(nid, form_key)` by exact equality only; key
//!   normalization happens in the resolver before querying.
//! - Rows are returned in ascending `cid` order.
//! - No implementation writes to the legacy store.

use crate::db::{verify_legacy_schema, DbError};
use crate::model::component::LegacyComponentRecord;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const COMPONENT_SELECT_SQL: &str = "SELECT
    nid,
    cid,
    form_key,
    name,
    type,
    extra
FROM webform_component
WHERE nid = ?1
  AND form_key = ?2
ORDER BY cid ASC;";

pub type RepoResult<T> = Result<T, RepoError>;

/// Transport or data-shape failure while reading the legacy store.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid legacy component data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read-only view of legacy webform components.
pub trait LegacyComponentRepository {
    /// Returns every component row of node `nid` whose key equals `form_key`.
    fn query_component(&self, nid: i64, form_key: &str)
        -> RepoResult<Vec<LegacyComponentRecord>>;
}

impl<T: LegacyComponentRepository + ?Sized> LegacyComponentRepository for &T {
    fn query_component(
        &self,
        nid: i64,
        form_key: &str,
    ) -> RepoResult<Vec<LegacyComponentRecord>> {
        (**self).query_component(nid, form_key)
    }
}

/// SQLite-backed legacy component repository.
pub struct SqliteComponentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteComponentRepository<'conn> {
    /// Wraps a connection after checking the component table shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        verify_legacy_schema(conn)?;
        Ok(Self { conn })
    }
}

impl LegacyComponentRepository for SqliteComponentRepository<'_> {
    fn query_component(
        &self,
        nid: i64,
        form_key: &str,
    ) -> RepoResult<Vec<LegacyComponentRecord>> {
        let mut stmt = self.conn.prepare_cached(COMPONENT_SELECT_SQL)?;
        let mut rows = stmt.query(params![nid, form_key])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_component_row(row)?);
        }

        Ok(records)
    }
}

/// In-memory legacy store, for fixtures and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryComponentRepository {
    records: Vec<LegacyComponentRecord>,
}

impl MemoryComponentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: LegacyComponentRecord) {
        self.records.push(record);
    }

    pub fn with_record(mut self, record: LegacyComponentRecord) -> Self {
        self.insert(record);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl LegacyComponentRepository for MemoryComponentRepository {
    fn query_component(
        &self,
        nid: i64,
        form_key: &str,
    ) -> RepoResult<Vec<LegacyComponentRecord>> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|record| record.nid == nid && record.form_key == form_key)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.cid);
        Ok(records)
    }
}

fn parse_component_row(row: &Row<'_>) -> RepoResult<LegacyComponentRecord> {
    let form_key: Option<String> = row.get("form_key")?;
    let form_key = form_key.ok_or_else(|| {
        RepoError::InvalidData("null form_key in webform_component.form_key".to_string())
    })?;

    let component_type = row
        .get::<_, Option<String>>("type")?
        .filter(|value| !value.is_empty());

    Ok(LegacyComponentRecord {
        nid: row.get("nid")?,
        cid: row.get("cid")?,
        form_key,
        name: row.get::<_, Option<String>>("name")?.unwrap_or_default(),
        component_type,
        extra: row.get::<_, Option<String>>("extra")?.unwrap_or_default(),
    })
}
