//! Migration use-case services.
//!
//! # Responsibility
//! - Resolve legacy metadata, transform elements and walk element trees.
//! - Expose the per-row hook the host pipeline calls.
//!
//! # Invariants
//! - Services reach the legacy store only through `LegacyComponentRepository`.

pub mod component_resolver;
pub mod element_rules;
pub mod report;
pub mod row_handler;
pub mod tree_migrator;
