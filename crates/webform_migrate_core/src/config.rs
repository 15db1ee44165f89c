//! Migration settings.
//!
//! # Responsibility
//! - Name the host migration that carries webform documents.
//! - Name the source-row properties the row handler reads and writes.
//!
//! # Invariants
//! - Every field has a default matching the Drupal 7 webform upgrade, so an
//!   empty settings file is valid.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Host migration ID whose rows are webform documents.
pub const DEFAULT_WEBFORM_MIGRATION_ID: &str = "upgrade_d7_webform";
pub const DEFAULT_ELEMENTS_PROPERTY: &str = "elements";
pub const DEFAULT_NID_PROPERTY: &str = "nid";

/// Row handler settings, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MigrationSettings {
    /// Migration ID routed to the webform element migration.
    pub webform_migration_id: String,
    /// Source property holding the element tree (YAML text or mapping).
    pub elements_property: String,
    /// Source property holding the legacy node ID.
    pub nid_property: String,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            webform_migration_id: DEFAULT_WEBFORM_MIGRATION_ID.to_string(),
            elements_property: DEFAULT_ELEMENTS_PROPERTY.to_string(),
            nid_property: DEFAULT_NID_PROPERTY.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_yaml::Error),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read settings `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid settings: {err}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

impl MigrationSettings {
    pub fn from_yaml_str(text: &str) -> Result<Self, SettingsError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(SettingsError::Parse)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }
}
