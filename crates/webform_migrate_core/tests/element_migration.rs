use rusqlite::{params, Connection};
use serde_yaml::Value;
use std::cell::RefCell;
use webform_migrate_core::db::open_legacy_db_in_memory;
use webform_migrate_core::{
    decode_elements, encode_elements, Element, ElementTree, LegacyComponentRecord,
    LegacyComponentRepository, MemoryComponentRepository, MigrateError, PropertyContainer,
    RepoResult, RowMigrationHandler, RowOutcome, SourceRow, SqliteComponentRepository,
    TreeMigrator,
};

const PRIVATE_EXTRA: &str = "a:2:{s:7:\"private\";i:1;s:5:\"width\";s:0:\"\";}";
const PUBLIC_EXTRA: &str = "a:1:{s:7:\"private\";i:0;}";

fn insert_component(conn: &Connection, cid: i64, form_key: &str, component_type: &str, extra: &str) {
    conn.execute(
        "INSERT INTO webform_component (nid, cid, form_key, name, type, extra)
         VALUES (42, ?1, ?2, ?2, ?3, ?4);",
        params![cid, form_key, component_type, extra],
    )
    .unwrap();
}

fn contact_form_store() -> Connection {
    let conn = open_legacy_db_in_memory().unwrap();
    insert_component(&conn, 1, "contact", "fieldset", PUBLIC_EXTRA);
    insert_component(&conn, 2, "name", "textfield", "");
    insert_component(&conn, 3, "email", "textfield", PRIVATE_EXTRA);
    conn
}

fn child(tree: &ElementTree, path: &[&str]) -> Element {
    let mut element = tree.element(path[0]).unwrap();
    for key in &path[1..] {
        element = match element.property(key) {
            Some(Value::Mapping(mapping)) => Element::from_mapping(mapping.clone()),
            other => panic!("`{key}` is not an element: {other:?}"),
        };
    }
    element
}

/// Records every key looked up, in order.
struct RecordingRepository {
    inner: MemoryComponentRepository,
    lookups: RefCell<Vec<String>>,
}

impl LegacyComponentRepository for RecordingRepository {
    fn query_component(&self, nid: i64, form_key: &str) -> RepoResult<Vec<LegacyComponentRecord>> {
        self.lookups.borrow_mut().push(form_key.to_string());
        self.inner.query_component(nid, form_key)
    }
}

#[test]
fn contact_form_migrates_end_to_end() {
    let conn = contact_form_store();
    let repo = SqliteComponentRepository::try_new(&conn).unwrap();
    let handler = RowMigrationHandler::new(repo);

    let mut row = SourceRow::with_elements(42, "fieldset_contact:\n  name: {}\n  email_3: {}\n");
    let outcome = handler.on_prepare_row(&mut row, "upgrade_d7_webform");
    assert_eq!(outcome, RowOutcome::Migrated { elements_migrated: 3 });

    let tree = match row.get("elements") {
        Some(Value::Mapping(mapping)) => ElementTree::from_mapping(mapping.clone()),
        other => panic!("elements should be structured after migration: {other:?}"),
    };

    let fieldset = child(&tree, &["fieldset_contact"]);
    assert_eq!(fieldset.element_type(), "fieldset");
    assert_eq!(fieldset.property("#private"), None);
    assert_eq!(fieldset.child_keys(), vec!["name", "email_3"]);

    let name = child(&tree, &["fieldset_contact", "name"]);
    assert_eq!(name.element_type(), "textfield");
    assert_eq!(name.property("#private"), None);

    let email = child(&tree, &["fieldset_contact", "email_3"]);
    assert_eq!(email.element_type(), "textfield");
    assert_eq!(email.property("#private"), Some(&Value::Bool(true)));
}

#[test]
fn children_are_migrated_before_their_parent() {
    let repo = RecordingRepository {
        inner: MemoryComponentRepository::new()
            .with_record(LegacyComponentRecord::new(42, 1, "page").with_type("wizard_page"))
            .with_record(LegacyComponentRecord::new(42, 2, "group").with_type("fieldset"))
            .with_record(LegacyComponentRecord::new(42, 3, "leaf").with_type("textfield"))
            .with_record(LegacyComponentRecord::new(42, 4, "sibling").with_type("textfield")),
        lookups: RefCell::new(Vec::new()),
    };
    let migrator = TreeMigrator::new(&repo);
    let tree = decode_elements(
        "page:\n  '#type': wizard_page\n  group:\n    leaf: {}\n  sibling:\n    '#type': textfield\n",
    )
    .unwrap();

    migrator.migrate_document(&tree, 42).unwrap();

    // Each untyped element is looked up twice: settings, then type.
    assert_eq!(
        *repo.lookups.borrow(),
        vec!["leaf", "leaf", "group", "group", "sibling", "page"]
    );
}

#[test]
fn parent_rule_sees_migrated_children() {
    let repo = MemoryComponentRepository::new()
        .with_record(LegacyComponentRecord::new(42, 1, "intro").with_type("processed_text"))
        .with_record(
            LegacyComponentRecord::new(42, 2, "secret")
                .with_type("hidden")
                .with_extra(PRIVATE_EXTRA),
        );
    let migrator = TreeMigrator::new(repo);

    let mut secret = Element::new();
    secret.set_property("#title", Value::from("Secret"));
    let mut intro = Element::new();
    intro.set_property("#title", Value::from("Intro"));
    intro.set_property("secret", secret.into());

    let migrated = migrator.migrate_element("intro", intro, 42).unwrap();

    assert_eq!(migrated.property("#admin_title"), Some(&Value::from("Intro")));
    let secret = match migrated.property("secret") {
        Some(Value::Mapping(mapping)) => Element::from_mapping(mapping.clone()),
        other => panic!("secret should stay a child element: {other:?}"),
    };
    // The nested element keeps its own `#title`; only processed_text renames.
    assert_eq!(secret.property("#title"), Some(&Value::from("Secret")));
    assert_eq!(secret.property("#private"), Some(&Value::Bool(true)));
    assert_eq!(secret.element_type(), "hidden");
}

#[test]
fn unregistered_type_is_identity_after_generic_rule() {
    let repo = MemoryComponentRepository::new().with_record(
        LegacyComponentRecord::new(42, 1, "phone")
            .with_type("textfield")
            .with_extra(PUBLIC_EXTRA),
    );
    let migrator = TreeMigrator::new(repo);
    let tree = decode_elements(
        "'#method': post\nphone:\n  '#type': tel\n  '#title': Phone\n  '#required': true\n",
    )
    .unwrap();

    let migrated = migrator.migrate_document(&tree, 42).unwrap();
    assert_eq!(migrated, tree);
    assert_eq!(
        encode_elements(&migrated).unwrap(),
        encode_elements(&tree).unwrap()
    );
}

#[test]
fn processed_text_title_becomes_admin_title() {
    let repo = MemoryComponentRepository::new()
        .with_record(LegacyComponentRecord::new(42, 1, "markup_1").with_type("markup"))
        .with_record(LegacyComponentRecord::new(42, 2, "markup_2").with_type("markup"));
    let migrator = TreeMigrator::new(repo);
    let tree = decode_elements(
        "markup_1:\n  '#type': processed_text\n  '#title': Hello\n  '#text': '<p>Hi</p>'\nmarkup_2:\n  '#type': processed_text\n  '#text': '<p>No title</p>'\n",
    )
    .unwrap();

    let migrated = migrator.migrate_document(&tree, 42).unwrap();

    let with_title = migrated.element("markup_1").unwrap();
    assert_eq!(with_title.property("#admin_title"), Some(&Value::from("Hello")));
    assert_eq!(with_title.property("#title"), None);
    assert_eq!(migrated.element("markup_2"), tree.element("markup_2"));
}

#[test]
fn ambiguous_legacy_rows_skip_the_document() {
    let conn = open_legacy_db_in_memory().unwrap();
    insert_component(&conn, 1, "name_2", "textfield", "");
    insert_component(&conn, 2, "name_2", "textfield", "");
    insert_component(&conn, 3, "name", "textfield", "");
    insert_component(&conn, 4, "name", "textfield", "");
    let repo = SqliteComponentRepository::try_new(&conn).unwrap();
    let handler = RowMigrationHandler::new(repo);

    let elements = "name_2:\n  '#type': textfield\n";
    let mut row = SourceRow::with_elements(42, elements);
    let outcome = handler.on_prepare_row(&mut row, "upgrade_d7_webform");

    let reason = match outcome {
        RowOutcome::Skip { reason } => reason,
        other => panic!("document should be skipped, got {other:?}"),
    };
    assert!(reason.contains("name_2"));
    assert!(reason.contains("42"));
    assert!(reason.contains("found 2 rows"));
    assert_eq!(row.get("elements"), Some(&Value::from(elements)));
}

#[test]
fn key_needing_two_normalizations_is_not_resolved() {
    let repo = MemoryComponentRepository::new()
        .with_record(LegacyComponentRecord::new(42, 1, "contact").with_type("fieldset"));
    let migrator = TreeMigrator::new(repo);
    let tree = decode_elements("fieldset_contact_2: {}\n").unwrap();

    let err = migrator.migrate_document(&tree, 42).unwrap_err();
    assert!(matches!(
        err,
        MigrateError::NotFound { ref form_key, nid: 42, match_count: 0 } if form_key == "fieldset_contact_2"
    ));
}

#[test]
fn malformed_extra_payload_skips_the_document() {
    let conn = open_legacy_db_in_memory().unwrap();
    insert_component(&conn, 1, "name", "textfield", "a:1:{s:7:\"private\";");
    let repo = SqliteComponentRepository::try_new(&conn).unwrap();
    let handler = RowMigrationHandler::new(repo);

    let mut row = SourceRow::with_elements(42, "name: {}\n");
    let outcome = handler.on_prepare_row(&mut row, "upgrade_d7_webform");
    assert!(matches!(
        outcome,
        RowOutcome::Skip { ref reason } if reason.contains("malformed serialized payload")
    ));
}

#[test]
fn structured_elements_are_accepted_as_is() {
    let repo = MemoryComponentRepository::new()
        .with_record(LegacyComponentRecord::new(42, 1, "name").with_type("textfield"));
    let handler = RowMigrationHandler::new(repo);

    let tree = decode_elements("name: {}\n").unwrap();
    let mut row = SourceRow::with_elements(42, tree);
    let outcome = handler.on_prepare_row(&mut row, "upgrade_d7_webform");

    assert_eq!(outcome, RowOutcome::Migrated { elements_migrated: 1 });
    let migrated = match row.get("elements") {
        Some(Value::Mapping(mapping)) => ElementTree::from_mapping(mapping.clone()),
        other => panic!("unexpected elements: {other:?}"),
    };
    assert_eq!(migrated.element("name").unwrap().element_type(), "textfield");
}
