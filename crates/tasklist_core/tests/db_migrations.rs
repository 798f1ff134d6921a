use rusqlite::Connection;
use tasklist_core::db::migrations::latest_version;
use tasklist_core::db::{open_store, open_store_in_memory, StoreError};

#[test]
fn fresh_store_migrates_to_latest_with_no_rows() {
    let conn = open_store_in_memory(Some(latest_version())).unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "tasks");

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn opening_same_store_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasklist.db");

    let conn_first = open_store(&path, Some(latest_version())).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_store(&path, Some(latest_version())).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "tasks");
}

#[test]
fn target_version_caps_applied_steps() {
    let conn = open_store_in_memory(Some(2)).unwrap();

    assert_eq!(schema_version(&conn), 2);
    assert_table_exists(&conn, "tasks");
    // The version-2 shape predates the reset/order columns.
    let columns = table_columns(&conn);
    assert!(!columns.iter().any(|name| name == "last_reset"));
    assert!(!columns.iter().any(|name| name == "order"));
}

#[test]
fn open_without_target_skips_migration_entirely() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasklist.db");

    let conn = open_store(&path, None).unwrap();
    assert_eq!(schema_version(&conn), 0);
}

#[test]
fn migration_from_v1_backfills_reset_and_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasklist.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE tasks (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            done INTEGER NOT NULL DEFAULT 0
        );
        PRAGMA user_version = 1;",
    )
    .unwrap();
    for (id, title, done) in [
        ("00000000-0000-4000-8000-000000000001", "water plants", 1),
        ("00000000-0000-4000-8000-000000000002", "stretch", 0),
        ("00000000-0000-4000-8000-000000000003", "read", 1),
    ] {
        conn.execute(
            "INSERT INTO tasks (id, title, done) VALUES (?1, ?2, ?3);",
            rusqlite::params![id, title, done],
        )
        .unwrap();
    }
    drop(conn);

    let conn = open_store(&path, Some(latest_version())).unwrap();
    assert_eq!(schema_version(&conn), latest_version());

    let mut stmt = conn
        .prepare("SELECT title, done, last_reset, \"order\" FROM tasks ORDER BY \"order\" ASC;")
        .unwrap();
    let rows: Vec<(String, i64, i64, i64)> = stmt
        .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(rows.len(), 3);
    for (index, (_, _, last_reset, order)) in rows.iter().enumerate() {
        assert!(*last_reset > 0, "last_reset must be backfilled");
        assert_eq!(*order, index as i64, "orders must be dense and unique");
    }
    // Relative sequence follows insertion order, done flags are carried over.
    assert_eq!(rows[0].0, "water plants");
    assert_eq!(rows[1].0, "stretch");
    assert_eq!(rows[2].0, "read");
    assert_eq!(rows[0].1, 1);
    assert_eq!(rows[1].1, 0);
    assert_eq!(rows[2].1, 1);
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_store(&path, Some(latest_version())).unwrap_err();
    match err {
        StoreError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn table_columns(conn: &Connection) -> Vec<String> {
    let mut stmt = conn.prepare("PRAGMA table_info(tasks);").unwrap();
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    columns
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
