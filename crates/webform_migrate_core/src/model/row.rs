//! Source row handed over by the host migration pipeline.
//!
//! # Responsibility
//! - Hold the source properties of one webform document being migrated.
//!
//! # Invariants
//! - Property order is preserved.
//! - Only the row handler writes back, and only after a full migration.

use serde_yaml::{Mapping, Value};

/// Source properties of one document (`nid`, `title`, `elements`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRow {
    properties: Mapping,
}

impl SourceRow {
    /// Creates a row with no source properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for the common `nid` + `elements` shape.
    pub fn with_elements(nid: i64, elements: impl Into<Value>) -> Self {
        let mut row = Self::new();
        row.set_source_property("nid", Value::from(nid));
        row.set_source_property("elements", elements.into());
        row
    }

    /// Returns the source property `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Sets the source property `name`, replacing any previous value.
    pub fn set_source_property(&mut self, name: &str, value: Value) {
        self.properties
            .insert(Value::String(name.to_string()), value);
    }
}
