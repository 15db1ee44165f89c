//! Core of the Drupal 7 to Drupal 9+ webform element migration.
//!
//! One source row at a time, the element tree of a webform is walked
//! post-order, legacy component settings are backfilled from the old
//! `webform_component` table and type-specific rules are applied.

pub mod codec;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use codec::php_serialized::{ExtraData, PhpKey, PhpValue};
pub use codec::yaml::{decode_elements, encode_elements};
pub use codec::CodecError;
pub use config::{MigrationSettings, SettingsError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::component::LegacyComponentRecord;
pub use model::element::{child_keys, is_child_key, Element, ElementTree, PropertyContainer};
pub use model::row::SourceRow;
pub use repo::component_repo::{
    LegacyComponentRepository, MemoryComponentRepository, RepoError, RepoResult,
    SqliteComponentRepository,
};
pub use service::component_resolver::{
    FallbackPattern, LegacyMetadataResolver, MigrateError, MigrateResult,
};
pub use service::element_rules::{ElementRule, RuleContext};
pub use service::report::{MigrationReport, SkippedRow};
pub use service::row_handler::{DocumentKind, RowError, RowMigrationHandler, RowOutcome};
pub use service::tree_migrator::TreeMigrator;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
