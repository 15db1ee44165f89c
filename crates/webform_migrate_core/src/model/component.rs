//! Legacy webform component record.
//!
//! # Responsibility
//! - Mirror one row of the legacy `webform_component` table.
//!
//! # Invariants
//! - Records are read-only snapshots; nothing in core writes them back.
//! - `extra` is kept as the raw serialized blob and decoded on demand.

use serde::Serialize;

/// One legacy component row keyed by `(nid, form_key)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyComponentRecord {
    /// Legacy node ID owning the webform.
    pub nid: i64,
    /// Component ID, unique per node.
    pub cid: i64,
    /// Machine key of the component inside its form.
    pub form_key: String,
    /// Human label.
    pub name: String,
    /// Component type (`textfield`, `fieldset`, `markup`, ...).
    ///
    /// Serialized as `type` to match the legacy column name.
    #[serde(rename = "type")]
    pub component_type: Option<String>,
    /// Serialized extra settings blob.
    pub extra: String,
}

impl LegacyComponentRecord {
    pub fn new(nid: i64, cid: i64, form_key: impl Into<String>) -> Self {
        let form_key = form_key.into();
        Self {
            nid,
            cid,
            name: form_key.clone(),
            form_key,
            component_type: None,
            extra: String::new(),
        }
    }

    pub fn with_type(mut self, component_type: impl Into<String>) -> Self {
        self.component_type = Some(component_type.into());
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    /// Type to install on an element; empty when the row carries none.
    pub fn type_or_empty(&self) -> &str {
        self.component_type.as_deref().unwrap_or("")
    }
}
