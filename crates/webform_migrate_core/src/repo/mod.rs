//! Repository layer over the legacy store.
//!
//! # Responsibility
//! - Define the read-only lookup contract used by the resolver.
//! - Isolate SQLite query details from migration logic.
//!
//! # Invariants
//! - Repositories never normalize keys; they report exactly what matched.

pub mod component_repo;
