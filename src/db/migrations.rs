//! Forward-only schema migration framework.
//!
//! Tracks the schema version in `schema_meta` and runs sequential migrations
//! to bring the database up to [`CURRENT_SCHEMA_VERSION`].

use rusqlite::Connection;

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// Identifier of the digest scheme used for fact ids. Stored in
/// `schema_meta` so a future change of digest can re-key fact ids in one
/// pass; server startup warns when the stored value differs.
pub const HASH_ALGORITHM: &str = "sha256-canonical-json";

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().unwrap_or(0))
        },
    )
}

/// Update the stored schema version.
fn update_schema_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
        [version.to_string()],
    )?;
    Ok(())
}

/// Run any pending forward-only migrations.
pub fn run_migrations(conn: &Connection) -> rusqlite::Result<()> {
    let mut version = get_schema_version(conn)?;
    tracing::debug!(schema_version = version, target = CURRENT_SCHEMA_VERSION, "checking migrations");

    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        tracing::info!(from = version, to = next, "running migration");

        match next {
            2 => migrate_v1_to_v2(conn)?,
            3 => migrate_v2_to_v3(conn)?,
            _ => {
                tracing::error!(version = next, "unknown migration target");
                break;
            }
        }

        update_schema_version(conn, next)?;
        version = next;
    }

    Ok(())
}

/// Migration v1 → v2: record the canonical hash algorithm so a future change
/// of digest can re-key fact ids in one pass.
fn migrate_v1_to_v2(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('hash_algorithm', ?1)",
        [HASH_ALGORITHM],
    )?;
    Ok(())
}

/// Migration v2 → v3: per-fact `confidence` and an explicit `sealed` flag,
/// and `atlas_frames.frame_id` becomes nullable for frames generated without
/// a linked session.
///
/// Column checks make this safe on databases whose base DDL already carries
/// the v3 shape.
fn migrate_v2_to_v3(conn: &Connection) -> rusqlite::Result<()> {
    if !column_exists(conn, "facts", "confidence")? {
        conn.execute("ALTER TABLE facts ADD COLUMN confidence REAL", [])?;
    }
    if !column_exists(conn, "facts", "sealed")? {
        conn.execute(
            "ALTER TABLE facts ADD COLUMN sealed INTEGER NOT NULL DEFAULT 0",
            [],
        )?;
    }
    // SQLite cannot drop NOT NULL in place; rebuild the table when needed.
    if column_is_not_null(conn, "atlas_frames", "frame_id")? {
        conn.execute_batch(
            "CREATE TABLE atlas_frames_migrate (
                atlas_frame_id TEXT PRIMARY KEY,
                frame_id TEXT,
                payload TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            INSERT INTO atlas_frames_migrate
                SELECT atlas_frame_id, frame_id, payload, created_at FROM atlas_frames;
            DROP TABLE atlas_frames;
            ALTER TABLE atlas_frames_migrate RENAME TO atlas_frames;",
        )?;
    }
    Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
        rusqlite::params![table, column],
        |r| r.get(0),
    )?;
    Ok(count > 0)
}

fn column_is_not_null(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2 AND \"notnull\" = 1",
        rusqlite::params![table, column],
        |r| r.get(0),
    )?;
    Ok(count > 0)
}

/// Get the stored hash algorithm identifier, if any.
pub fn get_hash_algorithm(conn: &Connection) -> rusqlite::Result<Option<String>> {
    match conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'hash_algorithm'",
        [],
        |row| row.get::<_, String>(0),
    ) {
        Ok(val) => Ok(Some(val)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}
