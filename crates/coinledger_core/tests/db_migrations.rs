use coinledger_core::db::migrations::latest_version;
use coinledger_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "accounts");
    assert_table_exists(&conn, "items");
    assert_table_exists(&conn, "transactions");
    assert_table_exists(&conn, "inventory");
}

#[test]
fn catalog_is_seeded_with_merch() {
    let conn = open_db_in_memory().unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM items;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 10);

    let hoody_price: i64 = conn
        .query_row("SELECT price FROM items WHERE name = 'hoody';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(hoody_price, 300);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coinledger.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let count: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM items;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 10, "seed must not be applied twice");
}

#[test]
fn file_databases_use_wal_journal() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("wal.db")).unwrap();

    let mode: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
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
fn schema_rejects_negative_balance_and_bad_records() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO accounts (username, password_hash, balance) VALUES ('alice', 'h', 10);",
        [],
    )
    .unwrap();

    assert!(conn
        .execute("UPDATE accounts SET balance = -1 WHERE username = 'alice';", [])
        .is_err());
    assert!(conn
        .execute(
            "INSERT INTO transactions (uuid, kind, from_account_id, amount)
             VALUES ('x', 'transfer', 1, 5);",
            [],
        )
        .is_err());
    assert!(conn
        .execute(
            "INSERT INTO transactions (uuid, kind, from_account_id, item_id, amount)
             VALUES ('y', 'purchase', 1, 1, 0);",
            [],
        )
        .is_err());
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
