//! Per-type element transformation rules.
//!
//! # Responsibility
//! - Map element types to transformation rules through a static registry.
//! - Implement each rule as a pure function over one element.
//! - Apply legacy settings that concern every element type.
//!
//! # Invariants
//! - Unknown types have no rule; callers pass such elements through as-is.
//! - Rules never fail: a missing source property makes the rule a no-op.

use crate::codec::php_serialized::ExtraData;
use crate::model::element::{Element, PropertyContainer};
use serde_yaml::Value;

/// Property set on elements whose legacy component was marked private.
pub const PRIVATE_PROPERTY: &str = "#private";
/// Legacy `extra` setting carrying the private flag.
pub const PRIVATE_SETTING: &str = "private";

const MARKUP_PROPERTY_RENAMES: &[(&str, &str)] = &[("#title", "#admin_title")];

/// Element being transformed, for rules that need more than its properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleContext<'a> {
    pub key: &'a str,
    pub nid: i64,
}

/// Registered type-specific transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRule {
    /// Processed-text markup keeps its label as an admin-only title.
    MigrateMarkupField,
}

const RULE_REGISTRY: &[(&str, ElementRule)] =
    &[("processed_text", ElementRule::MigrateMarkupField)];

impl ElementRule {
    /// Looks up the rule registered for `element_type`.
    pub fn for_type(element_type: &str) -> Option<Self> {
        RULE_REGISTRY
            .iter()
            .find(|(registered, _)| *registered == element_type)
            .map(|(_, rule)| *rule)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::MigrateMarkupField => "migrate_markup_field",
        }
    }

    pub fn apply(self, element: Element, context: &RuleContext<'_>) -> Element {
        match self {
            Self::MigrateMarkupField => migrate_markup_field(element, context),
        }
    }
}

/// Element types that have a registered rule.
pub fn registered_types() -> impl Iterator<Item = &'static str> {
    RULE_REGISTRY.iter().map(|(element_type, _)| *element_type)
}

/// Renames `#title` to `#admin_title`, keeping the value.
pub fn migrate_markup_field(mut element: Element, _context: &RuleContext<'_>) -> Element {
    for (from, to) in MARKUP_PROPERTY_RENAMES {
        if let Some(value) = element.remove_property(from) {
            element.set_property(to, value);
        }
    }
    element
}

/// Copies type-independent legacy settings onto an element.
pub fn apply_legacy_flags(mut element: Element, extra: &ExtraData) -> Element {
    if extra.flag(PRIVATE_SETTING) {
        element.set_property(PRIVATE_PROPERTY, Value::Bool(true));
    }
    element
}
