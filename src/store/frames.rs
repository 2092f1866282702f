//! Frame index — work-session snapshots and their Atlas Frame blobs.
//!
//! Frames are mutable session state under active editing, so inserts are
//! last-write-wins by id (`INSERT OR REPLACE`), unlike the append-only fact
//! table. Atlas Frames are immutable JSON blobs addressed by generated id and
//! referenced from a Frame by id only.

use rusqlite::{params, Connection, OptionalExtension};

use crate::atlas::{build_atlas_frame, AtlasFrame, PolicySource};
use crate::error::{Result, WaymarkError};
use crate::store::recall::normalize_tokens;
use crate::store::types::Frame;

/// A frame submission before capture assigns id, timestamp, and atlas link.
#[derive(Debug, Clone)]
pub struct FrameDraft {
    pub branch: String,
    pub jira: Option<String>,
    pub module_scope: Vec<String>,
    pub reference_point: String,
    pub summary_caption: String,
    pub status_snapshot: serde_json::Value,
    pub keywords: Vec<String>,
}

/// Insert or replace a frame row. The reference point is tokenized at write
/// time so recall never re-normalizes stored text, and the timestamp is
/// normalized to one UTC RFC 3339 form so lexicographic order equals
/// chronological order across sources (`Z` and `+00:00` suffixes sort
/// differently raw).
pub fn insert_frame(conn: &Connection, frame: &Frame) -> Result<()> {
    let timestamp = chrono::DateTime::parse_from_rfc3339(&frame.timestamp)
        .map_err(|e| {
            WaymarkError::Encoding(format!(
                "timestamp '{}' is not RFC 3339: {e}",
                frame.timestamp
            ))
        })?
        .with_timezone(&chrono::Utc)
        .to_rfc3339();
    let tokens = normalize_tokens(&frame.reference_point);
    let module_scope = serde_json::to_string(&frame.module_scope)
        .map_err(|e| WaymarkError::Encoding(e.to_string()))?;
    let reference_tokens = serde_json::to_string(&tokens)
        .map_err(|e| WaymarkError::Encoding(e.to_string()))?;
    let status_snapshot = serde_json::to_string(&frame.status_snapshot)
        .map_err(|e| WaymarkError::Encoding(e.to_string()))?;
    let keywords = serde_json::to_string(&frame.keywords)
        .map_err(|e| WaymarkError::Encoding(e.to_string()))?;

    conn.execute(
        "INSERT OR REPLACE INTO frames \
         (id, timestamp, branch, jira, module_scope, reference_point, reference_tokens, \
          summary_caption, status_snapshot, keywords, atlas_frame_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            frame.id,
            timestamp,
            frame.branch,
            frame.jira,
            module_scope,
            frame.reference_point,
            reference_tokens,
            frame.summary_caption,
            status_snapshot,
            keywords,
            frame.atlas_frame_id,
        ],
    )?;
    Ok(())
}

/// Fetch a frame by id.
pub fn get_frame(conn: &Connection, id: &str) -> Result<Option<Frame>> {
    conn.query_row(
        "SELECT id, timestamp, branch, jira, module_scope, reference_point, \
         summary_caption, status_snapshot, keywords, atlas_frame_id \
         FROM frames WHERE id = ?1",
        params![id],
        |row| {
            let module_scope: String = row.get(4)?;
            let status_snapshot: String = row.get(7)?;
            let keywords: String = row.get(8)?;
            Ok(Frame {
                id: row.get(0)?,
                timestamp: row.get(1)?,
                branch: row.get(2)?,
                jira: row.get(3)?,
                module_scope: serde_json::from_str(&module_scope).unwrap_or_default(),
                reference_point: row.get(5)?,
                summary_caption: row.get(6)?,
                status_snapshot: serde_json::from_str(&status_snapshot)
                    .unwrap_or(serde_json::Value::Null),
                keywords: serde_json::from_str(&keywords).unwrap_or_default(),
                atlas_frame_id: row.get(9)?,
            })
        },
    )
    .optional()
    .map_err(Into::into)
}

/// Persist an Atlas Frame as an immutable blob addressed by its generated id.
pub fn persist_atlas_frame(conn: &Connection, atlas: &AtlasFrame) -> Result<()> {
    let payload =
        serde_json::to_string(atlas).map_err(|e| WaymarkError::Encoding(e.to_string()))?;
    conn.execute(
        "INSERT INTO atlas_frames (atlas_frame_id, frame_id, payload, created_at) \
         VALUES (?1, ?2, ?3, ?4)",
        params![
            atlas.atlas_frame_id,
            atlas.frame_id,
            payload,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Fetch an Atlas Frame blob by id.
pub fn get_atlas_frame(conn: &Connection, atlas_frame_id: &str) -> Result<Option<AtlasFrame>> {
    let payload: Option<String> = conn
        .query_row(
            "SELECT payload FROM atlas_frames WHERE atlas_frame_id = ?1",
            params![atlas_frame_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(payload.and_then(|p| serde_json::from_str(&p).ok()))
}

/// Capture a work-session snapshot.
///
/// Attaches an Atlas Frame iff a policy source is supplied and the draft's
/// `module_scope` seeds resolve against it. Policy problems are recovered
/// locally — the capture proceeds with `atlas_frame_id = None` and a log
/// line, never a fatal error.
pub fn capture_frame(
    conn: &Connection,
    draft: &FrameDraft,
    policy_source: Option<PolicySource>,
    fold_radius: i64,
) -> Result<Frame> {
    let frame_id = uuid::Uuid::now_v7().to_string();

    let atlas_frame_id = match policy_source {
        Some(source) if !draft.module_scope.is_empty() => {
            let (graph, policy) = source.into_parts();
            match build_atlas_frame(
                Some(&frame_id),
                &draft.module_scope,
                fold_radius,
                &graph,
                &policy,
            ) {
                Ok(atlas) => {
                    persist_atlas_frame(conn, &atlas)?;
                    Some(atlas.atlas_frame_id)
                }
                Err(e) => {
                    tracing::warn!(frame_id = %frame_id, error = %e,
                        "atlas frame generation failed, capturing frame without it");
                    None
                }
            }
        }
        Some(_) => {
            tracing::debug!(frame_id = %frame_id, "empty module scope, no atlas frame");
            None
        }
        None => None,
    };

    let frame = Frame {
        id: frame_id,
        timestamp: chrono::Utc::now().to_rfc3339(),
        branch: draft.branch.clone(),
        jira: draft.jira.clone(),
        module_scope: draft.module_scope.clone(),
        reference_point: draft.reference_point.clone(),
        summary_caption: draft.summary_caption.clone(),
        status_snapshot: draft.status_snapshot.clone(),
        keywords: draft.keywords.clone(),
        atlas_frame_id,
    };

    insert_frame(conn, &frame)?;
    tracing::info!(frame_id = %frame.id, has_atlas = frame.atlas_frame_id.is_some(),
        "frame captured");
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn draft(reference_point: &str) -> FrameDraft {
        FrameDraft {
            branch: "feature/payments-split".into(),
            jira: Some("PAY-42".into()),
            module_scope: vec!["payments".into()],
            reference_point: reference_point.into(),
            summary_caption: "split payments module".into(),
            status_snapshot: serde_json::json!({"tests": "green"}),
            keywords: vec!["payments".into(), "split".into()],
        }
    }

    fn policy_source() -> PolicySource {
        serde_json::from_value(serde_json::json!({
            "modules": [
                {"id": "payments", "allowed_callers": ["checkout"]},
                {"id": "ledger"},
            ],
            "edges": [["payments", "ledger"]],
        }))
        .unwrap()
    }

    #[test]
    fn insert_frame_is_last_write_wins() {
        let conn = db::open_memory_database().unwrap();
        let frame = capture_frame(&conn, &draft("first version"), None, 1).unwrap();

        let mut edited = frame.clone();
        edited.summary_caption = "corrected caption".into();
        insert_frame(&conn, &edited).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM frames", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);

        let fetched = get_frame(&conn, &frame.id).unwrap().unwrap();
        assert_eq!(fetched.summary_caption, "corrected caption");
    }

    #[test]
    fn capture_without_policy_has_no_atlas_frame() {
        let conn = db::open_memory_database().unwrap();
        let frame = capture_frame(&conn, &draft("no policy today"), None, 1).unwrap();
        assert!(frame.atlas_frame_id.is_none());
    }

    #[test]
    fn capture_with_policy_attaches_atlas_frame() {
        let conn = db::open_memory_database().unwrap();
        let frame =
            capture_frame(&conn, &draft("with policy"), Some(policy_source()), 1).unwrap();

        let atlas_id = frame.atlas_frame_id.expect("atlas frame attached");
        let atlas = get_atlas_frame(&conn, &atlas_id).unwrap().unwrap();
        assert_eq!(atlas.frame_id.as_deref(), Some(frame.id.as_str()));
        assert_eq!(atlas.seed_modules, ["payments"]);
        let ids: Vec<&str> = atlas.modules.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["ledger", "payments"]);
    }

    #[test]
    fn capture_with_unknown_seed_recovers_without_atlas() {
        let conn = db::open_memory_database().unwrap();
        let mut d = draft("unknown scope");
        d.module_scope = vec!["not-in-policy".into()];

        let frame = capture_frame(&conn, &d, Some(policy_source()), 1).unwrap();
        assert!(frame.atlas_frame_id.is_none());

        // The frame itself was still captured
        assert!(get_frame(&conn, &frame.id).unwrap().is_some());
    }

    #[test]
    fn capture_with_empty_scope_skips_atlas() {
        let conn = db::open_memory_database().unwrap();
        let mut d = draft("empty scope");
        d.module_scope = vec![];

        let frame = capture_frame(&conn, &d, Some(policy_source()), 1).unwrap();
        assert!(frame.atlas_frame_id.is_none());
    }

    #[test]
    fn atlas_frame_round_trips_through_storage() {
        let conn = db::open_memory_database().unwrap();
        let (graph, policy) = policy_source().into_parts();
        let atlas = crate::atlas::build_atlas_frame(
            Some("frame-x"),
            &["payments".to_string()],
            1,
            &graph,
            &policy,
        )
        .unwrap();

        persist_atlas_frame(&conn, &atlas).unwrap();
        let fetched = get_atlas_frame(&conn, &atlas.atlas_frame_id).unwrap().unwrap();
        assert_eq!(fetched.atlas_frame_id, atlas.atlas_frame_id);
        assert_eq!(fetched.fold_radius, 1);
        assert_eq!(fetched.edges.len(), atlas.edges.len());
    }

    #[test]
    fn insert_normalizes_timestamps_to_one_utc_form() {
        let conn = db::open_memory_database().unwrap();
        let mut frame = capture_frame(&conn, &draft("normalize me"), None, 1).unwrap();
        frame.timestamp = "2026-08-10T09:00:00Z".into();
        insert_frame(&conn, &frame).unwrap();

        let stored = get_frame(&conn, &frame.id).unwrap().unwrap();
        assert_eq!(stored.timestamp, "2026-08-10T09:00:00+00:00");
    }

    #[test]
    fn malformed_timestamp_is_rejected() {
        let conn = db::open_memory_database().unwrap();
        let mut frame = capture_frame(&conn, &draft("bad clock"), None, 1).unwrap();
        frame.timestamp = "yesterday-ish".into();
        assert!(matches!(
            insert_frame(&conn, &frame).unwrap_err(),
            WaymarkError::Encoding(_)
        ));
    }

    #[test]
    fn missing_atlas_frame_is_none() {
        let conn = db::open_memory_database().unwrap();
        assert!(get_atlas_frame(&conn, "missing").unwrap().is_none());
    }
}
