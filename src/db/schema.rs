//! SQL DDL for all Waymark tables.
//!
//! Defines the `facts`, `locks`, `frames`, `atlas_frames`, and `schema_meta`
//! tables. All DDL uses `IF NOT EXISTS` for idempotent initialization.
//!
//! `facts.created_at` is unix seconds so the TTL predicate in `expire` is
//! plain integer arithmetic evaluated inside the DELETE statement. Frames
//! keep ISO 8601 text timestamps for recency ordering.

use rusqlite::Connection;

/// All schema DDL statements for Waymark's core tables.
const SCHEMA_SQL: &str = r#"
-- Append-only, content-addressed fact storage
CREATE TABLE IF NOT EXISTS facts (
    fact_id TEXT PRIMARY KEY,
    kind TEXT NOT NULL CHECK(kind IN (
        'repo_scan','dep_graph','dep_score','plan','merge_order',
        'gate_result','artifact','note','frame','atlas_frame')),
    repo TEXT NOT NULL,
    commit_sha TEXT NOT NULL,
    path TEXT,
    symbol TEXT,
    inputs_hash TEXT NOT NULL,
    payload TEXT NOT NULL,
    payload_hash TEXT NOT NULL,
    actor TEXT,
    refs TEXT,
    ttl_seconds INTEGER,
    created_at INTEGER NOT NULL,
    confidence REAL,
    sealed INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_facts_scope ON facts(repo, commit_sha, kind);
CREATE INDEX IF NOT EXISTS idx_facts_inputs ON facts(inputs_hash);
CREATE INDEX IF NOT EXISTS idx_facts_ttl ON facts(ttl_seconds) WHERE ttl_seconds IS NOT NULL;

-- Named advisory locks: presence of a row means held. No owner, no lease.
CREATE TABLE IF NOT EXISTS locks (
    name TEXT PRIMARY KEY,
    acquired_at INTEGER NOT NULL
);

-- Work-session snapshots, last-write-wins by id
CREATE TABLE IF NOT EXISTS frames (
    id TEXT PRIMARY KEY,
    timestamp TEXT NOT NULL,
    branch TEXT NOT NULL,
    jira TEXT,
    module_scope TEXT NOT NULL,
    reference_point TEXT NOT NULL,
    reference_tokens TEXT NOT NULL,
    summary_caption TEXT NOT NULL,
    status_snapshot TEXT NOT NULL,
    keywords TEXT NOT NULL,
    atlas_frame_id TEXT
);

CREATE INDEX IF NOT EXISTS idx_frames_jira ON frames(jira);
CREATE INDEX IF NOT EXISTS idx_frames_timestamp ON frames(timestamp);

-- Immutable bounded-neighborhood blobs, referenced from frames by id only.
-- frame_id is NULL for atlas frames generated without a linked frame.
CREATE TABLE IF NOT EXISTS atlas_frames (
    atlas_frame_id TEXT PRIMARY KEY,
    frame_id TEXT,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"facts".to_string()));
        assert!(tables.contains(&"locks".to_string()));
        assert!(tables.contains(&"frames".to_string()));
        assert!(tables.contains(&"atlas_frames".to_string()));
        assert!(tables.contains(&"schema_meta".to_string()));
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap(); // second call should not error
    }
}
