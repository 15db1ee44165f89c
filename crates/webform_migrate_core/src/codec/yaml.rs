//! `elements` YAML codec.
//!
//! Webform element trees travel as YAML text in source rows. Decoding accepts
//! an empty document as an empty tree.

use super::CodecError;
use crate::model::element::{ElementTree, PropertyContainer};
use serde_yaml::Value;

/// Decodes serialized `elements` into a tree.
pub fn decode_elements(serialized: &str) -> Result<ElementTree, CodecError> {
    if serialized.trim().is_empty() {
        return Ok(ElementTree::new());
    }
    let value: Value = serde_yaml::from_str(serialized)?;
    tree_from_value(value)
}

/// Encodes a tree back to YAML text.
pub fn encode_elements(tree: &ElementTree) -> Result<String, CodecError> {
    Ok(serde_yaml::to_string(tree.mapping())?)
}

/// Accepts an already structured value as a tree.
pub fn tree_from_value(value: Value) -> Result<ElementTree, CodecError> {
    match value {
        Value::Mapping(mapping) => Ok(ElementTree::from_mapping(mapping)),
        Value::Null => Ok(ElementTree::new()),
        other => Err(CodecError::NotAMapping(value_kind(&other))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
