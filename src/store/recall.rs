//! Frame recall — exact id, fuzzy reference point, or ticket lookup.
//!
//! Resolution priority is fixed: `frame_id` (exact) beats `reference_point`
//! (fuzzy token overlap) beats `jira` (exact, most recent wins). Fuzzy
//! matching is an explicit tokenizer owned here, independent of the storage
//! engine: lowercase, punctuation stripped, naive suffix stripping, then
//! token-overlap scoring against a fixed threshold.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashSet;

use crate::atlas::AtlasFrame;
use crate::error::{Result, WaymarkError};
use crate::store::frames;
use crate::store::types::Frame;

/// Fraction of query tokens that must appear in the stored reference point.
const OVERLAP_THRESHOLD: f64 = 0.5;

/// A recall query; exactly the populated field with the highest priority is
/// used for resolution.
#[derive(Debug, Clone, Default)]
pub struct RecallQuery {
    pub frame_id: Option<String>,
    pub reference_point: Option<String>,
    pub jira: Option<String>,
}

/// A resolved Frame plus its Atlas Frame when the referenced blob still
/// exists. A dangling reference yields `atlas_frame = None`, never a miss.
#[derive(Debug, Serialize)]
pub struct RecallResult {
    pub frame: Frame,
    pub atlas_frame: Option<AtlasFrame>,
}

/// Normalize free text into matchable tokens: lowercase, strip punctuation,
/// strip naive English suffixes (`ing`, `ed`, plural `s`).
pub fn normalize_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| strip_suffix(&t.to_lowercase()))
        .filter(|t| !t.is_empty())
        .collect()
}

fn strip_suffix(token: &str) -> String {
    for (suffix, min_len) in [("ing", 5), ("ed", 4), ("s", 4)] {
        if token.len() >= min_len {
            if let Some(stem) = token.strip_suffix(suffix) {
                return stem.to_string();
            }
        }
    }
    token.to_string()
}

/// Fraction of query tokens found in the candidate token set.
fn overlap_score(query_tokens: &[String], candidate_tokens: &HashSet<&str>) -> f64 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let hits = query_tokens
        .iter()
        .filter(|t| candidate_tokens.contains(t.as_str()))
        .count();
    hits as f64 / query_tokens.len() as f64
}

/// Resolve a recall query to exactly one Frame.
pub fn recall(conn: &Connection, query: &RecallQuery) -> Result<RecallResult> {
    let frame = if let Some(ref id) = query.frame_id {
        frames::get_frame(conn, id)?.ok_or(WaymarkError::NotFound)?
    } else if let Some(ref reference) = query.reference_point {
        resolve_by_reference_point(conn, reference)?.ok_or(WaymarkError::NotFound)?
    } else if let Some(ref jira) = query.jira {
        resolve_by_jira(conn, jira)?.ok_or(WaymarkError::NotFound)?
    } else {
        return Err(WaymarkError::NotFound);
    };

    // Architectural context is best-effort: a frame whose atlas blob has been
    // removed still recalls cleanly.
    let atlas_frame = match frame.atlas_frame_id {
        Some(ref atlas_id) => {
            let found = frames::get_atlas_frame(conn, atlas_id)?;
            if found.is_none() {
                tracing::warn!(frame_id = %frame.id, atlas_frame_id = %atlas_id,
                    "atlas frame reference is dangling");
            }
            found
        }
        None => None,
    };

    Ok(RecallResult { frame, atlas_frame })
}

/// Fuzzy match over stored reference points. Highest overlap wins; ties go to
/// the most recent timestamp.
fn resolve_by_reference_point(conn: &Connection, reference: &str) -> Result<Option<Frame>> {
    let query_tokens = normalize_tokens(reference);
    if query_tokens.is_empty() {
        return Ok(None);
    }

    let mut stmt =
        conn.prepare("SELECT id, reference_tokens, timestamp FROM frames ORDER BY timestamp DESC")?;
    let candidates = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut best: Option<(String, f64)> = None;
    // Candidates arrive newest-first, so a strict improvement check keeps the
    // most recent frame on score ties.
    for (id, tokens_json, _timestamp) in candidates {
        let stored: Vec<String> = serde_json::from_str(&tokens_json).unwrap_or_default();
        let stored_set: HashSet<&str> = stored.iter().map(String::as_str).collect();
        let score = overlap_score(&query_tokens, &stored_set);
        if score >= OVERLAP_THRESHOLD && best.as_ref().map_or(true, |(_, s)| score > *s) {
            best = Some((id, score));
        }
    }

    match best {
        Some((id, score)) => {
            tracing::debug!(frame_id = %id, score, "reference point matched");
            frames::get_frame(conn, &id)
        }
        None => Ok(None),
    }
}

/// Exact ticket match; most recent frame wins when several share the ticket.
fn resolve_by_jira(conn: &Connection, jira: &str) -> Result<Option<Frame>> {
    let id: Option<String> = conn
        .query_row(
            "SELECT id FROM frames WHERE jira = ?1 ORDER BY timestamp DESC LIMIT 1",
            params![jira],
            |row| row.get(0),
        )
        .optional()?;
    match id {
        Some(id) => frames::get_frame(conn, &id),
        None => Ok(None),
    }
}
