use sitegantt_core::db::migrations::latest_version;
use sitegantt_core::db::{open_db, open_db_in_memory, DbError};
use sitegantt_core::{SqliteTaskRepository, TaskRepoError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "projects",
        "profiles",
        "tasks",
        "subtasks",
        "timesheets",
        "purchase_orders",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sitegantt.db");

    let conn_first = open_db(&path).unwrap();
    let project_id = SqliteTaskRepository::try_new(&conn_first)
        .unwrap()
        .create_project("Torre Norte")
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let name: String = conn_second
        .query_row(
            "SELECT name FROM projects WHERE id = ?1;",
            [project_id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(name, "Torre Norte");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
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
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteTaskRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        TaskRepoError::Db(DbError::UninitializedConnection {
            actual_version: 0,
            ..
        })
    ));
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();

    let result = conn.execute(
        "INSERT INTO tasks (id, project_id, name, start_date, end_date)
         VALUES ('t1', 'missing-project', 'Cimentación', '2024-01-01', '2024-01-31');",
        [],
    );
    assert!(result.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "missing table {table_name}");
}
