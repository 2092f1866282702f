//! Aggregate counts for the `stats` CLI command.

use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Serialize)]
pub struct StoreStats {
    pub total_facts: usize,
    pub facts_by_kind: HashMap<String, usize>,
    pub facts_with_ttl: usize,
    pub held_locks: Vec<String>,
    pub total_frames: usize,
    pub frames_with_atlas: usize,
    pub total_atlas_frames: usize,
    pub db_size_bytes: u64,
}

/// Collect store-wide counts in one pass.
pub fn store_stats(conn: &Connection, db_path: Option<&Path>) -> Result<StoreStats> {
    let total_facts =
        conn.query_row("SELECT COUNT(*) FROM facts", [], |r| r.get::<_, i64>(0))? as usize;

    let mut facts_by_kind = HashMap::new();
    let mut stmt = conn.prepare("SELECT kind, COUNT(*) FROM facts GROUP BY kind")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
    })?;
    for row in rows {
        let (kind, count) = row?;
        facts_by_kind.insert(kind, count);
    }

    let facts_with_ttl = conn.query_row(
        "SELECT COUNT(*) FROM facts WHERE ttl_seconds IS NOT NULL",
        [],
        |r| r.get::<_, i64>(0),
    )? as usize;

    let mut stmt = conn.prepare("SELECT name FROM locks ORDER BY name")?;
    let held_locks = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let total_frames =
        conn.query_row("SELECT COUNT(*) FROM frames", [], |r| r.get::<_, i64>(0))? as usize;
    let frames_with_atlas = conn.query_row(
        "SELECT COUNT(*) FROM frames WHERE atlas_frame_id IS NOT NULL",
        [],
        |r| r.get::<_, i64>(0),
    )? as usize;
    let total_atlas_frames =
        conn.query_row("SELECT COUNT(*) FROM atlas_frames", [], |r| r.get::<_, i64>(0))? as usize;

    let db_size_bytes = db_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(StoreStats {
        total_facts,
        facts_by_kind,
        facts_with_ttl,
        held_locks,
        total_frames,
        frames_with_atlas,
        total_atlas_frames,
        db_size_bytes,
    })
}
