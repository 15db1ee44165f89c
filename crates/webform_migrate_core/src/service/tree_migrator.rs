//! Recursive webform element migration.
//!
//! # Responsibility
//! - Walk an element tree post-order: children first, then their parent.
//! - Backfill legacy settings and missing element types from the legacy store.
//! - Dispatch type-specific rules from the rule registry.
//!
//! # Invariants
//! - Root-level properties are never touched; only child elements migrate.
//! - Non-mapping children are left as they are.
//! - A failing lookup aborts the whole document; no partial tree is returned.

use crate::codec::php_serialized::ExtraData;
use crate::model::element::{child_entries, Element, ElementTree, PropertyContainer, TYPE_PROPERTY};
use crate::repo::component_repo::LegacyComponentRepository;
use crate::service::component_resolver::{LegacyMetadataResolver, MigrateResult};
use crate::service::element_rules::{apply_legacy_flags, ElementRule, RuleContext};
use log::{debug, info};
use serde_yaml::{Mapping, Value};
use std::time::Instant;

/// Post-order element tree migrator.
pub struct TreeMigrator<R: LegacyComponentRepository> {
    resolver: LegacyMetadataResolver<R>,
}

impl<R: LegacyComponentRepository> TreeMigrator<R> {
    /// Creates a migrator resolving legacy metadata through `repo`.
    pub fn new(repo: R) -> Self {
        Self {
            resolver: LegacyMetadataResolver::new(repo),
        }
    }

    /// Migrates every root-level element of `tree` for node `nid`.
    ///
    /// Returns a new tree; `tree` itself is left untouched, so a failure
    /// leaves the caller with the original document.
    pub fn migrate_document(&self, tree: &ElementTree, nid: i64) -> MigrateResult<ElementTree> {
        let started_at = Instant::now();
        let mut mapping = tree.mapping().clone();
        self.migrate_children(&mut mapping, nid)?;

        let migrated = ElementTree::from_mapping(mapping);
        info!(
            "event=document_migrate module=migrator status=ok nid={} elements={} duration_ms={}",
            nid,
            migrated.element_count(),
            started_at.elapsed().as_millis()
        );
        Ok(migrated)
    }

    /// Migrates one element and its children.
    ///
    /// Order: children, legacy settings, type backfill, type rule.
    pub fn migrate_element(&self, key: &str, element: Element, nid: i64) -> MigrateResult<Element> {
        let mut mapping = element.into_mapping();
        self.migrate_children(&mut mapping, nid)?;

        let mut element = self.apply_generic_rule(key, Element::from_mapping(mapping), nid, None)?;

        if !element.has_type() {
            let record = self.resolver.resolve_component_data(nid, key, true)?;
            element.set_property(TYPE_PROPERTY, Value::from(record.type_or_empty()));
        }

        let rule = ElementRule::for_type(element.element_type());
        debug!(
            "event=element_migrate module=migrator status=ok nid={} key={} type={} rule={}",
            nid,
            key,
            element.element_type(),
            rule.map_or("none", ElementRule::name)
        );

        match rule {
            Some(rule) => Ok(rule.apply(element, &RuleContext { key, nid })),
            None => Ok(element),
        }
    }

    /// Applies legacy settings shared by every element type.
    ///
    /// `extra` skips the store lookup when the caller already holds the
    /// component's settings.
    pub fn apply_generic_rule(
        &self,
        key: &str,
        element: Element,
        nid: i64,
        extra: Option<&ExtraData>,
    ) -> MigrateResult<Element> {
        match extra {
            Some(extra) => Ok(apply_legacy_flags(element, extra)),
            None => {
                let extra = self.resolver.resolve_extra_data(nid, key, true)?;
                Ok(apply_legacy_flags(element, &extra))
            }
        }
    }

    fn migrate_children(&self, mapping: &mut Mapping, nid: i64) -> MigrateResult<()> {
        for (raw_key, name) in child_entries(mapping) {
            let Some(Value::Mapping(child)) = mapping.get_mut(&raw_key) else {
                continue;
            };
            let element = Element::from_mapping(std::mem::take(child));
            *child = self.migrate_element(&name, element, nid)?.into_mapping();
        }
        Ok(())
    }
}
