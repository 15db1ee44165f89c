use rusqlite::{params, Connection};
use webform_migrate_core::db::{
    install_legacy_schema, open_legacy_db, open_legacy_db_in_memory, DbError,
};
use webform_migrate_core::{LegacyComponentRepository, RepoError, SqliteComponentRepository};

fn insert_component(
    conn: &Connection,
    nid: i64,
    cid: i64,
    form_key: &str,
    component_type: &str,
    extra: &str,
) {
    conn.execute(
        "INSERT INTO webform_component (nid, cid, form_key, name, type, extra)
         VALUES (?1, ?2, ?3, ?3, ?4, ?5);",
        params![nid, cid, form_key, component_type, extra],
    )
    .unwrap();
}

#[test]
fn in_memory_store_has_component_table() {
    let conn = open_legacy_db_in_memory().unwrap();

    let mut stmt = conn
        .prepare("PRAGMA table_info(webform_component);")
        .unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut columns = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        let column_name: String = row.get(1).unwrap();
        columns.push(column_name);
    }
    for expected in ["nid", "cid", "pid", "form_key", "name", "type", "extra"] {
        assert!(columns.contains(&expected.to_string()), "missing {expected}");
    }
}

#[test]
fn query_matches_nid_and_key_exactly() {
    let conn = open_legacy_db_in_memory().unwrap();
    insert_component(&conn, 42, 1, "email", "email", "");
    insert_component(&conn, 42, 2, "email_2", "textfield", "");
    insert_component(&conn, 43, 1, "email", "email", "");
    let repo = SqliteComponentRepository::try_new(&conn).unwrap();

    let rows = repo.query_component(42, "email").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].nid, 42);
    assert_eq!(rows[0].cid, 1);
    assert_eq!(rows[0].component_type.as_deref(), Some("email"));

    assert!(repo.query_component(42, "EMAIL").unwrap().is_empty());
    assert!(repo.query_component(42, "emai%").unwrap().is_empty());
    assert!(repo.query_component(44, "email").unwrap().is_empty());
}

#[test]
fn duplicate_keys_return_every_row_in_cid_order() {
    let conn = open_legacy_db_in_memory().unwrap();
    insert_component(&conn, 42, 9, "name", "textfield", "");
    insert_component(&conn, 42, 3, "name", "textfield", "");
    let repo = SqliteComponentRepository::try_new(&conn).unwrap();

    let cids: Vec<_> = repo
        .query_component(42, "name")
        .unwrap()
        .into_iter()
        .map(|record| record.cid)
        .collect();
    assert_eq!(cids, vec![3, 9]);
}

#[test]
fn null_and_empty_columns_are_normalized() {
    let conn = open_legacy_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO webform_component (nid, cid, form_key, name, type)
         VALUES (42, 1, 'markup', NULL, '');",
        [],
    )
    .unwrap();
    let repo = SqliteComponentRepository::try_new(&conn).unwrap();

    let record = repo.query_component(42, "markup").unwrap().remove(0);
    assert_eq!(record.component_type, None);
    assert_eq!(record.name, "");
    assert_eq!(record.extra, "");
}

#[test]
fn repository_rejects_connection_without_legacy_table() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteComponentRepository::try_new(&conn)
        .err()
        .expect("missing table should be rejected");
    assert!(matches!(
        err,
        RepoError::Db(DbError::MissingTable("webform_component"))
    ));
}

#[test]
fn file_snapshot_opens_read_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.sqlite3");
    {
        let conn = Connection::open(&path).unwrap();
        install_legacy_schema(&conn).unwrap();
        insert_component(&conn, 42, 1, "name", "textfield", "a:0:{}");
    }

    let conn = open_legacy_db(&path).unwrap();
    let repo = SqliteComponentRepository::try_new(&conn).unwrap();
    assert_eq!(repo.query_component(42, "name").unwrap().len(), 1);

    let write = conn.execute("DELETE FROM webform_component;", []);
    assert!(write.is_err());
}

#[test]
fn file_snapshot_without_component_table_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.sqlite3");
    Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE variable (name TEXT, value BLOB);")
        .unwrap();

    let err = open_legacy_db(&path).unwrap_err();
    assert!(matches!(err, DbError::MissingTable("webform_component")));
}

#[test]
fn missing_snapshot_file_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let err = open_legacy_db(dir.path().join("absent.sqlite3")).unwrap_err();
    assert!(matches!(err, DbError::Sqlite(_)));
}
