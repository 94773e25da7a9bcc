use goaltracker_core::db::migrations::latest_version;
use goaltracker_core::db::{open_db, open_db_in_memory, open_persistence_unit, DbError};
use goaltracker_core::{PersistenceUnit, StorageTarget};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "goals");
    assert_table_exists(&conn, "habits");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("goaltracker.sqlite3");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute("INSERT INTO goals (name) VALUES ('Kept');", [])
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let kept: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM goals WHERE name = 'Kept';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(kept, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn habits_schema_rejects_negative_counters_and_orphans() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO goals (name) VALUES ('G');", [])
        .unwrap();

    assert!(conn
        .execute(
            "INSERT INTO habits (goal_name, name, counter) VALUES ('G', 'H', -1);",
            [],
        )
        .is_err());
    assert!(conn
        .execute(
            "INSERT INTO habits (goal_name, name, counter) VALUES ('Missing', 'H', 0);",
            [],
        )
        .is_err());
}

#[test]
fn persistence_unit_selects_file_or_memory_target() {
    let dir = tempfile::tempdir().unwrap();
    let file_unit = PersistenceUnit {
        name: "default".to_string(),
        target: StorageTarget::File(dir.path().join("unit.sqlite3")),
    };
    let conn = open_persistence_unit(&file_unit).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert!(dir.path().join("unit.sqlite3").exists());

    let memory_unit = PersistenceUnit {
        name: "test".to_string(),
        target: StorageTarget::InMemory,
    };
    let conn = open_persistence_unit(&memory_unit).unwrap();
    assert_table_exists(&conn, "habits");
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
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
