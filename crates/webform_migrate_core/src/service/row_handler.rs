//! Per-row hook invoked by the host migration pipeline.
//!
//! # Responsibility
//! - Route rows by migration ID; only webform rows are migrated.
//! - Decode `elements`, migrate the tree and install the result.
//! - Turn every migration failure into a skip with a reason.
//!
//! # Invariants
//! - The row is written only after the whole tree migrated successfully.
//! - Rows of other migrations are returned untouched as `Ignored`.
//! - This is the only place where migration errors stop propagating.

use crate::codec::yaml::{decode_elements, tree_from_value};
use crate::config::MigrationSettings;
use crate::model::element::ElementTree;
use crate::model::row::SourceRow;
use crate::repo::component_repo::LegacyComponentRepository;
use crate::service::component_resolver::MigrateError;
use crate::service::tree_migrator::TreeMigrator;
use log::{debug, info, warn};
use serde_yaml::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result of handling one source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// The row's element tree was replaced by its migrated form.
    Migrated { elements_migrated: usize },
    /// The row belongs to a migration this handler does not process.
    Ignored,
    /// The host pipeline should skip this row.
    Skip { reason: String },
}

/// Document kinds this handler knows how to migrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Webform,
}

/// Failure while handling one webform row.
#[derive(Debug)]
pub enum RowError {
    MissingProperty(String),
    InvalidNid(String),
    Migrate(MigrateError),
}

impl Display for RowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingProperty(name) => write!(f, "source row has no `{name}` property"),
            Self::InvalidNid(found) => write!(f, "source row nid is not an integer: {found}"),
            Self::Migrate(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Migrate(err) => Some(err),
            Self::MissingProperty(_) | Self::InvalidNid(_) => None,
        }
    }
}

impl From<MigrateError> for RowError {
    fn from(value: MigrateError) -> Self {
        Self::Migrate(value)
    }
}

/// Host-facing row hook.
pub struct RowMigrationHandler<R: LegacyComponentRepository> {
    migrator: TreeMigrator<R>,
    settings: MigrationSettings,
}

impl<R: LegacyComponentRepository> RowMigrationHandler<R> {
    /// Creates a handler with the default Drupal 7 webform settings.
    pub fn new(repo: R) -> Self {
        Self::with_settings(repo, MigrationSettings::default())
    }

    /// Creates a handler routing and reading rows as `settings` describes.
    pub fn with_settings(repo: R, settings: MigrationSettings) -> Self {
        Self {
            migrator: TreeMigrator::new(repo),
            settings,
        }
    }

    /// Active routing and property-name settings.
    pub fn settings(&self) -> &MigrationSettings {
        &self.settings
    }

    /// Picks the document kind for a host migration ID.
    pub fn route(&self, migration_id: &str) -> Option<DocumentKind> {
        if migration_id == self.settings.webform_migration_id {
            return Some(DocumentKind::Webform);
        }
        None
    }

    /// Handles one source row of migration `migration_id`.
    pub fn on_prepare_row(&self, row: &mut SourceRow, migration_id: &str) -> RowOutcome {
        match self.route(migration_id) {
            Some(DocumentKind::Webform) => self.migrate_webform(row),
            None => {
                debug!(
                    "event=row_prepare module=row_handler status=ignored migration_id={}",
                    migration_id
                );
                RowOutcome::Ignored
            }
        }
    }

    fn migrate_webform(&self, row: &mut SourceRow) -> RowOutcome {
        match self.try_migrate_webform(row) {
            Ok(elements_migrated) => {
                info!(
                    "event=row_prepare module=row_handler status=ok elements={}",
                    elements_migrated
                );
                RowOutcome::Migrated { elements_migrated }
            }
            Err(err) => {
                let reason = err.to_string();
                warn!(
                    "event=row_prepare module=row_handler status=skip reason={}",
                    reason
                );
                RowOutcome::Skip { reason }
            }
        }
    }

    fn try_migrate_webform(&self, row: &mut SourceRow) -> Result<usize, RowError> {
        let nid = self.read_nid(row)?;
        let tree = self.read_elements(row)?;

        let migrated = self.migrator.migrate_document(&tree, nid)?;
        let elements = migrated.element_count();
        row.set_source_property(&self.settings.elements_property, migrated.into());
        Ok(elements)
    }

    fn read_nid(&self, row: &SourceRow) -> Result<i64, RowError> {
        let name = &self.settings.nid_property;
        match row.get(name) {
            Some(Value::Number(number)) => number
                .as_i64()
                .ok_or_else(|| RowError::InvalidNid(number.to_string())),
            Some(Value::String(text)) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| RowError::InvalidNid(format!("`{text}`"))),
            Some(other) => Err(RowError::InvalidNid(format!("{other:?}"))),
            None => Err(RowError::MissingProperty(name.clone())),
        }
    }

    fn read_elements(&self, row: &SourceRow) -> Result<ElementTree, RowError> {
        let name = &self.settings.elements_property;
        let tree = match row.get(name) {
            Some(Value::String(serialized)) => decode_elements(serialized),
            Some(structured) => tree_from_value(structured.clone()),
            None => return Err(RowError::MissingProperty(name.clone())),
        };
        tree.map_err(|err| RowError::Migrate(MigrateError::Deserialization(err)))
    }
}
