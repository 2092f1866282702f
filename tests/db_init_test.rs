//! Database initialization against a real file path.

use waymark::db;

#[test]
fn open_database_creates_file_and_schema() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("waymark.db");

    let conn = db::open_database(&db_path).unwrap();
    assert!(db_path.exists());

    // WAL mode is on
    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |r| r.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");

    // Migrations ran
    let version = db::migrations::get_schema_version(&conn).unwrap();
    assert_eq!(version, db::migrations::CURRENT_SCHEMA_VERSION);

    // The digest scheme is recorded for startup mismatch checks
    assert_eq!(
        db::migrations::get_hash_algorithm(&conn).unwrap().as_deref(),
        Some(db::migrations::HASH_ALGORITHM)
    );
}

#[test]
fn reopening_preserves_data() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("waymark.db");

    {
        let conn = db::open_database(&db_path).unwrap();
        waymark::store::locks::acquire(&conn, "persisted").unwrap();
    }

    let conn = db::open_database(&db_path).unwrap();
    // Lock row survived the reopen, so a second acquire is refused
    assert!(!waymark::store::locks::acquire(&conn, "persisted").unwrap());
}
