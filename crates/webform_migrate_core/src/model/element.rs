//! Webform element tree model and key classification.
//!
//! # Responsibility
//! - Wrap the ordered YAML mapping that describes one webform element.
//! - Split mapping keys into property keys (`#`-prefixed) and child keys.
//! - Model the document root as its own type sharing the same container API.
//!
//! # Invariants
//! - A key is a child key iff it is non-empty and does not start with `#`.
//! - Empty keys (and `null` keys) are never children.
//! - Key order of the underlying mapping is preserved across edits.

use serde_yaml::{Mapping, Value};

/// Leading character reserved for element properties.
pub const PROPERTY_SENTINEL: char = '#';
/// Property holding the element type, e.g. `textfield` or `processed_text`.
pub const TYPE_PROPERTY: &str = "#type";

/// Returns whether `key` names a nested child element.
pub fn is_child_key(key: &str) -> bool {
    match key.chars().next() {
        Some(first) => first != PROPERTY_SENTINEL,
        None => false,
    }
}

/// Renders a YAML mapping key to the string form used by webform keys.
///
/// Returns `None` for keys that cannot name anything (`null`, nested
/// collections).
pub fn key_name(key: &Value) -> Option<String> {
    match key {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        Value::Tagged(tagged) => key_name(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Returns child keys of `mapping` in document order.
pub fn child_keys(mapping: &Mapping) -> Vec<String> {
    child_entries(mapping)
        .into_iter()
        .map(|(_, name)| name)
        .collect()
}

/// Returns `(raw key, rendered name)` pairs for every child key.
///
/// The raw key is kept so callers can address the entry without assuming it
/// was a YAML string.
pub(crate) fn child_entries(mapping: &Mapping) -> Vec<(Value, String)> {
    mapping
        .keys()
        .filter_map(|key| {
            let name = key_name(key)?;
            is_child_key(&name).then(|| (key.clone(), name))
        })
        .collect()
}

/// Counts nested elements below `mapping`, at every depth.
pub fn count_elements(mapping: &Mapping) -> usize {
    child_entries(mapping)
        .iter()
        .map(|(key, _)| match mapping.get(key) {
            Some(Value::Mapping(child)) => 1 + count_elements(child),
            _ => 0,
        })
        .sum()
}

/// Shared behavior of anything holding properties next to child elements.
pub trait PropertyContainer {
    fn mapping(&self) -> &Mapping;
    fn mapping_mut(&mut self) -> &mut Mapping;

    /// Child keys in document order.
    fn child_keys(&self) -> Vec<String> {
        child_keys(self.mapping())
    }

    /// Returns the entry stored under `name`, property or child.
    fn property(&self, name: &str) -> Option<&Value> {
        self.mapping().get(name)
    }

    /// Sets `name`, keeping its position when it already exists.
    fn set_property(&mut self, name: &str, value: Value) {
        self.mapping_mut().insert(Value::String(name.to_string()), value);
    }

    /// Removes `name` without reordering the remaining entries.
    fn remove_property(&mut self, name: &str) -> Option<Value> {
        self.mapping_mut().shift_remove(name)
    }
}

/// One webform element: properties plus nested child elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    mapping: Mapping,
}

impl Element {
    /// Creates an element with no properties and no children.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a decoded element mapping as is.
    pub fn from_mapping(mapping: Mapping) -> Self {
        Self { mapping }
    }

    /// Unwraps the element back into its mapping.
    pub fn into_mapping(self) -> Mapping {
        self.mapping
    }

    /// Returns the `#type` value as text.
    ///
    /// Missing, `null` and non-string types read as an empty string, matching
    /// how an unset type is treated during dispatch.
    pub fn element_type(&self) -> &str {
        self.property(TYPE_PROPERTY)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn has_type(&self) -> bool {
        !self.element_type().is_empty()
    }
}

impl PropertyContainer for Element {
    fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    fn mapping_mut(&mut self) -> &mut Mapping {
        &mut self.mapping
    }
}

/// Root of a webform `elements` document.
///
/// Root-level entries follow the same classification as element entries, but
/// the root itself is never typed, looked up or dispatched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementTree {
    mapping: Mapping,
}

impl ElementTree {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a decoded document root as is.
    pub fn from_mapping(mapping: Mapping) -> Self {
        Self { mapping }
    }

    /// Unwraps the document back into its root mapping.
    pub fn into_mapping(self) -> Mapping {
        self.mapping
    }

    /// Number of elements in the tree, at every depth.
    pub fn element_count(&self) -> usize {
        count_elements(&self.mapping)
    }

    /// Returns a root-level child element by key, if it is a mapping.
    pub fn element(&self, key: &str) -> Option<Element> {
        match self.mapping.get(key) {
            Some(Value::Mapping(mapping)) => Some(Element::from_mapping(mapping.clone())),
            _ => None,
        }
    }
}

impl PropertyContainer for ElementTree {
    fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    fn mapping_mut(&mut self) -> &mut Mapping {
        &mut self.mapping
    }
}

impl From<ElementTree> for Value {
    fn from(value: ElementTree) -> Self {
        Value::Mapping(value.mapping)
    }
}

impl From<Element> for Value {
    fn from(value: Element) -> Self {
        Value::Mapping(value.mapping)
    }
}
