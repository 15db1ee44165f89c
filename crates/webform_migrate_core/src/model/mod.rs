//! Domain model for webform element migration.
//!
//! # Responsibility
//! - Define the element tree, source row and legacy record shapes.
//!
//! # Invariants
//! - Element trees are ordered mappings; migrations never reorder children.

pub mod component;
pub mod element;
pub mod row;
