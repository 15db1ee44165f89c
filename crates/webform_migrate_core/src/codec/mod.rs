//! Codecs at the edges of the migration core.
//!
//! # Responsibility
//! - Decode/encode the `elements` YAML carried by source rows.
//! - Decode the legacy `extra` blob stored per component.
//!
//! # Invariants
//! - Codec failures are reported as [`CodecError`], never as panics.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod php_serialized;
pub mod yaml;

/// Failure to decode or encode a serialized payload.
#[derive(Debug)]
pub enum CodecError {
    /// Malformed legacy `extra` blob; `offset` is the byte position.
    Php { offset: usize, message: String },
    /// Malformed or non-mapping `elements` YAML.
    Yaml(serde_yaml::Error),
    /// YAML parsed but its root is not a mapping.
    NotAMapping(&'static str),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Php { offset, message } => {
                write!(f, "malformed serialized payload at byte {offset}: {message}")
            }
            Self::Yaml(err) => write!(f, "malformed elements yaml: {err}"),
            Self::NotAMapping(found) => {
                write!(f, "elements yaml root must be a mapping, found {found}")
            }
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Yaml(err) => Some(err),
            Self::Php { .. } | Self::NotAMapping(_) => None,
        }
    }
}

impl From<serde_yaml::Error> for CodecError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}
