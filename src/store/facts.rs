//! Fact write and read path — append-only, content-addressed, TTL-governed.
//!
//! [`put_fact`] is the single write entry point. Identity is the digest of
//! `(kind, scope, inputs_hash, payload_hash)`; the insert is a single
//! `INSERT OR IGNORE` so two concurrent writers of the same fact cannot race
//! a read-then-write check. Re-submitting an identical fact succeeds with
//! `inserted = false`.

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::{Result, WaymarkError};
use crate::hash;
use crate::store::types::{Fact, FactKind, FactScope, Payload};

/// Minimum accepted TTL in seconds.
pub const MIN_TTL_SECONDS: i64 = 60;

/// Size and TTL ceilings, injected from config.
#[derive(Debug, Clone, Copy)]
pub struct FactLimits {
    pub max_payload_bytes: usize,
    pub max_ttl_seconds: i64,
}

/// A fact submission before identity is computed.
#[derive(Debug, Clone)]
pub struct FactDraft {
    pub kind: FactKind,
    pub scope: FactScope,
    pub inputs_hash: String,
    pub payload: Payload,
    /// Producer's confidence in the observation, `0.0..=1.0`. Metadata only;
    /// not part of the fact identity.
    pub confidence: Option<f64>,
    pub actor: Option<String>,
    pub refs: Vec<String>,
    pub ttl_seconds: Option<i64>,
}

/// Result returned from a put operation.
#[derive(Debug, Serialize)]
pub struct PutFactResult {
    pub fact_id: String,
    /// `false` when an identical fact already existed — success, not an error.
    pub inserted: bool,
}

/// Conjunctive exact-match filter for [`get_facts`]. Omitted optional fields
/// are unconstrained, not null-matched.
#[derive(Debug, Clone)]
pub struct FactFilter {
    pub repo: String,
    pub commit: String,
    pub kind: FactKind,
    pub path: Option<String>,
    pub symbol: Option<String>,
    pub inputs_hash: Option<String>,
}

/// Idempotent insert of a content-addressed fact.
///
/// Validates payload size and TTL bounds before touching the database, then
/// performs one atomic conditional insert.
pub fn put_fact(conn: &Connection, draft: &FactDraft, limits: &FactLimits) -> Result<PutFactResult> {
    let payload_json = serde_json::to_value(&draft.payload)
        .map_err(|e| WaymarkError::Encoding(e.to_string()))?;
    let payload_blob = hash::canonical_json(&payload_json)?;

    if payload_blob.len() > limits.max_payload_bytes {
        return Err(WaymarkError::PayloadTooLarge {
            size: payload_blob.len(),
            limit: limits.max_payload_bytes,
        });
    }

    if let Some(ttl) = draft.ttl_seconds {
        if ttl < MIN_TTL_SECONDS || ttl > limits.max_ttl_seconds {
            return Err(WaymarkError::InvalidTtl {
                ttl,
                min: MIN_TTL_SECONDS,
                max: limits.max_ttl_seconds,
            });
        }
    }

    if let Some(confidence) = draft.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(WaymarkError::InvalidConfidence(confidence));
        }
    }

    let payload_hash = hash::hash_value(&payload_json)?;
    let fact_id = hash::fact_id(
        draft.kind.as_str(),
        &draft.scope,
        &draft.inputs_hash,
        &payload_hash,
    )?;

    let refs_json = serde_json::to_string(&draft.refs)
        .map_err(|e| WaymarkError::Encoding(e.to_string()))?;
    let now = chrono::Utc::now().timestamp();
    let sealed = matches!(draft.payload, Payload::Sealed { .. });

    let inserted = conn.execute(
        "INSERT OR IGNORE INTO facts \
         (fact_id, kind, repo, commit_sha, path, symbol, inputs_hash, payload, payload_hash, \
          actor, refs, ttl_seconds, created_at, confidence, sealed) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            fact_id,
            draft.kind.as_str(),
            draft.scope.repo,
            draft.scope.commit,
            draft.scope.path,
            draft.scope.symbol,
            draft.inputs_hash,
            payload_blob,
            payload_hash,
            draft.actor,
            refs_json,
            draft.ttl_seconds,
            now,
            draft.confidence,
            sealed,
        ],
    )? == 1;

    tracing::debug!(fact_id = %fact_id, kind = %draft.kind, inserted, "put_fact");

    Ok(PutFactResult { fact_id, inserted })
}

/// Exact-match scoped lookup. All provided filters are ANDed; zero matches is
/// an empty vec, never an error. Supplying `inputs_hash` makes this a
/// cache-style exact-hit query.
pub fn get_facts(conn: &Connection, filter: &FactFilter) -> Result<Vec<Fact>> {
    let mut sql = String::from(
        "SELECT fact_id, kind, repo, commit_sha, path, symbol, inputs_hash, payload, \
         payload_hash, actor, refs, ttl_seconds, created_at, confidence, sealed \
         FROM facts WHERE repo = ?1 AND commit_sha = ?2 AND kind = ?3",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![
        Box::new(filter.repo.clone()),
        Box::new(filter.commit.clone()),
        Box::new(filter.kind.as_str().to_string()),
    ];

    if let Some(ref path) = filter.path {
        params_vec.push(Box::new(path.clone()));
        sql.push_str(&format!(" AND path = ?{}", params_vec.len()));
    }
    if let Some(ref symbol) = filter.symbol {
        params_vec.push(Box::new(symbol.clone()));
        sql.push_str(&format!(" AND symbol = ?{}", params_vec.len()));
    }
    if let Some(ref inputs_hash) = filter.inputs_hash {
        params_vec.push(Box::new(inputs_hash.clone()));
        sql.push_str(&format!(" AND inputs_hash = ?{}", params_vec.len()));
    }
    sql.push_str(" ORDER BY created_at DESC, fact_id");

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let rows = stmt
        .query_map(param_refs.as_slice(), row_to_fact)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Delete every fact whose TTL has elapsed at `now` (unix seconds).
///
/// The age predicate lives inside the DELETE so it is evaluated at execution
/// time; facts without a TTL are immortal. Returns the number of rows removed.
pub fn expire_facts(conn: &Connection, now: i64) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM facts WHERE ttl_seconds IS NOT NULL AND created_at + ttl_seconds < ?1",
        params![now],
    )?;
    if deleted > 0 {
        tracing::info!(deleted, "expired facts");
    }
    Ok(deleted)
}

fn row_to_fact(row: &rusqlite::Row<'_>) -> rusqlite::Result<Fact> {
    use rusqlite::types::Type;

    let kind_str: String = row.get(1)?;
    let kind = kind_str
        .parse::<FactKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, e.into()))?;

    // The sealed flag is the stored discriminant; the blob itself carries none.
    let payload_str: String = row.get(7)?;
    let sealed: bool = row.get(14)?;
    let payload = if sealed {
        match serde_json::from_str::<Payload>(&payload_str) {
            Ok(p @ Payload::Sealed { .. }) => p,
            _ => {
                return Err(rusqlite::Error::FromSqlConversionFailure(
                    7,
                    Type::Text,
                    "sealed payload is missing ciphertext/iv".to_string().into(),
                ))
            }
        }
    } else {
        Payload::Plain(
            serde_json::from_str(&payload_str)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?,
        )
    };

    let refs_str: Option<String> = row.get(10)?;
    let refs = match refs_str {
        Some(s) => serde_json::from_str(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?,
        None => Vec::new(),
    };

    Ok(Fact {
        fact_id: row.get(0)?,
        kind,
        scope: FactScope {
            repo: row.get(2)?,
            commit: row.get(3)?,
            path: row.get(4)?,
            symbol: row.get(5)?,
        },
        inputs_hash: row.get(6)?,
        payload,
        payload_hash: row.get(8)?,
        confidence: row.get(13)?,
        actor: row.get(9)?,
        refs,
        ttl_seconds: row.get(11)?,
        created_at: row.get(12)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn limits() -> FactLimits {
        FactLimits {
            max_payload_bytes: 1024,
            max_ttl_seconds: 2_592_000,
        }
    }

    fn draft(payload: serde_json::Value) -> FactDraft {
        FactDraft {
            kind: FactKind::Note,
            scope: FactScope {
                repo: "acme/widgets".into(),
                commit: "deadbeef".into(),
                path: None,
                symbol: None,
            },
            inputs_hash: "ih-1".into(),
            payload: Payload::Plain(payload),
            confidence: None,
            actor: None,
            refs: vec![],
            ttl_seconds: None,
        }
    }

    #[test]
    fn put_twice_is_idempotent() {
        let conn = db::open_memory_database().unwrap();
        let d = draft(serde_json::json!({"text": "hello"}));

        let first = put_fact(&conn, &d, &limits()).unwrap();
        let second = put_fact(&conn, &d, &limits()).unwrap();

        assert!(first.inserted);
        assert!(!second.inserted);
        assert_eq!(first.fact_id, second.fact_id);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM facts", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn key_order_yields_same_fact_id() {
        let conn = db::open_memory_database().unwrap();
        let a = draft(serde_json::json!({"x": 1, "y": 2}));
        let b = draft(serde_json::json!({"y": 2, "x": 1}));

        let first = put_fact(&conn, &a, &limits()).unwrap();
        let second = put_fact(&conn, &b, &limits()).unwrap();

        assert_eq!(first.fact_id, second.fact_id);
        assert!(!second.inserted);
    }

    #[test]
    fn oversized_payload_is_rejected_without_insert() {
        let conn = db::open_memory_database().unwrap();
        let d = draft(serde_json::json!({"blob": "x".repeat(2000)}));

        let err = put_fact(&conn, &d, &limits()).unwrap_err();
        assert!(matches!(err, WaymarkError::PayloadTooLarge { .. }));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM facts", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn ttl_bounds_are_enforced() {
        let conn = db::open_memory_database().unwrap();

        let mut short = draft(serde_json::json!({"a": 1}));
        short.ttl_seconds = Some(59);
        assert!(matches!(
            put_fact(&conn, &short, &limits()).unwrap_err(),
            WaymarkError::InvalidTtl { .. }
        ));

        let mut long = draft(serde_json::json!({"a": 2}));
        long.ttl_seconds = Some(limits().max_ttl_seconds + 1);
        assert!(matches!(
            put_fact(&conn, &long, &limits()).unwrap_err(),
            WaymarkError::InvalidTtl { .. }
        ));

        let mut ok = draft(serde_json::json!({"a": 3}));
        ok.ttl_seconds = Some(60);
        assert!(put_fact(&conn, &ok, &limits()).unwrap().inserted);
    }

    #[test]
    fn get_filters_are_conjunctive() {
        let conn = db::open_memory_database().unwrap();
        let mut with_path = draft(serde_json::json!({"n": 1}));
        with_path.scope.path = Some("src/lib.rs".into());
        put_fact(&conn, &with_path, &limits()).unwrap();

        let mut other_commit = draft(serde_json::json!({"n": 2}));
        other_commit.scope.commit = "cafef00d".into();
        put_fact(&conn, &other_commit, &limits()).unwrap();

        // Unconstrained path: both facts at deadbeef? only one exists there
        let all = get_facts(
            &conn,
            &FactFilter {
                repo: "acme/widgets".into(),
                commit: "deadbeef".into(),
                kind: FactKind::Note,
                path: None,
                symbol: None,
                inputs_hash: None,
            },
        )
        .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].scope.path.as_deref(), Some("src/lib.rs"));

        // Path-constrained miss
        let miss = get_facts(
            &conn,
            &FactFilter {
                repo: "acme/widgets".into(),
                commit: "deadbeef".into(),
                kind: FactKind::Note,
                path: Some("src/other.rs".into()),
                symbol: None,
                inputs_hash: None,
            },
        )
        .unwrap();
        assert!(miss.is_empty());
    }

    #[test]
    fn inputs_hash_filter_acts_as_cache_probe() {
        let conn = db::open_memory_database().unwrap();
        put_fact(&conn, &draft(serde_json::json!({"v": 1})), &limits()).unwrap();

        let hit = get_facts(
            &conn,
            &FactFilter {
                repo: "acme/widgets".into(),
                commit: "deadbeef".into(),
                kind: FactKind::Note,
                path: None,
                symbol: None,
                inputs_hash: Some("ih-1".into()),
            },
        )
        .unwrap();
        assert_eq!(hit.len(), 1);

        let miss = get_facts(
            &conn,
            &FactFilter {
                repo: "acme/widgets".into(),
                commit: "deadbeef".into(),
                kind: FactKind::Note,
                path: None,
                symbol: None,
                inputs_hash: Some("stale-hash".into()),
            },
        )
        .unwrap();
        assert!(miss.is_empty());
    }

    #[test]
    fn expire_respects_ttl_boundary() {
        let conn = db::open_memory_database().unwrap();
        let mut d = draft(serde_json::json!({"temp": true}));
        d.ttl_seconds = Some(60);
        let result = put_fact(&conn, &d, &limits()).unwrap();

        let created_at: i64 = conn
            .query_row(
                "SELECT created_at FROM facts WHERE fact_id = ?1",
                params![result.fact_id],
                |r| r.get(0),
            )
            .unwrap();

        // Not yet expired at created_at + 60 (strict inequality)
        assert_eq!(expire_facts(&conn, created_at + 60).unwrap(), 0);
        // Expired at created_at + 61
        assert_eq!(expire_facts(&conn, created_at + 61).unwrap(), 1);
        // Idempotent
        assert_eq!(expire_facts(&conn, created_at + 61).unwrap(), 0);
    }

    #[test]
    fn facts_without_ttl_are_immortal() {
        let conn = db::open_memory_database().unwrap();
        put_fact(&conn, &draft(serde_json::json!({"keep": true})), &limits()).unwrap();

        assert_eq!(expire_facts(&conn, i64::MAX).unwrap(), 0);
    }

    #[test]
    fn confidence_bounds_are_enforced() {
        let conn = db::open_memory_database().unwrap();

        for bad in [-0.1, 1.5] {
            let mut d = draft(serde_json::json!({"c": bad}));
            d.confidence = Some(bad);
            assert!(matches!(
                put_fact(&conn, &d, &limits()).unwrap_err(),
                WaymarkError::InvalidConfidence(_)
            ));
        }

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM facts", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn confidence_is_stored_and_read_back() {
        let conn = db::open_memory_database().unwrap();
        let mut d = draft(serde_json::json!({"scan": "clean"}));
        d.confidence = Some(0.85);
        put_fact(&conn, &d, &limits()).unwrap();

        let facts = get_facts(
            &conn,
            &FactFilter {
                repo: "acme/widgets".into(),
                commit: "deadbeef".into(),
                kind: FactKind::Note,
                path: None,
                symbol: None,
                inputs_hash: None,
            },
        )
        .unwrap();
        assert_eq!(facts[0].confidence, Some(0.85));
    }

    #[test]
    fn confidence_does_not_change_fact_identity() {
        let conn = db::open_memory_database().unwrap();
        let mut rated = draft(serde_json::json!({"n": 1}));
        rated.confidence = Some(0.9);
        let unrated = draft(serde_json::json!({"n": 1}));

        let first = put_fact(&conn, &rated, &limits()).unwrap();
        let second = put_fact(&conn, &unrated, &limits()).unwrap();

        assert_eq!(first.fact_id, second.fact_id);
        assert!(!second.inserted);
    }

    #[test]
    fn plain_payload_with_sealed_shape_stays_plain() {
        let conn = db::open_memory_database().unwrap();
        // Plain JSON that merely looks like a sealed envelope
        let d = draft(serde_json::json!({"ciphertext": "not encrypted", "iv": "just a key name"}));
        put_fact(&conn, &d, &limits()).unwrap();

        let facts = get_facts(
            &conn,
            &FactFilter {
                repo: "acme/widgets".into(),
                commit: "deadbeef".into(),
                kind: FactKind::Note,
                path: None,
                symbol: None,
                inputs_hash: None,
            },
        )
        .unwrap();
        match &facts[0].payload {
            Payload::Plain(v) => assert_eq!(v["ciphertext"], "not encrypted"),
            other => panic!("expected plain payload, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_payload_surfaces_an_error() {
        let conn = db::open_memory_database().unwrap();
        put_fact(&conn, &draft(serde_json::json!({"n": 1})), &limits()).unwrap();
        conn.execute("UPDATE facts SET payload = '{not json'", [])
            .unwrap();

        let err = get_facts(
            &conn,
            &FactFilter {
                repo: "acme/widgets".into(),
                commit: "deadbeef".into(),
                kind: FactKind::Note,
                path: None,
                symbol: None,
                inputs_hash: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, WaymarkError::Database(_)));
    }

    #[test]
    fn sealed_payload_is_stored_opaque() {
        let conn = db::open_memory_database().unwrap();
        let mut d = draft(serde_json::Value::Null);
        d.payload = Payload::Sealed {
            ciphertext: "6f7061717565".into(),
            iv: "303132".into(),
        };
        let result = put_fact(&conn, &d, &limits()).unwrap();
        assert!(result.inserted);

        let facts = get_facts(
            &conn,
            &FactFilter {
                repo: "acme/widgets".into(),
                commit: "deadbeef".into(),
                kind: FactKind::Note,
                path: None,
                symbol: None,
                inputs_hash: None,
            },
        )
        .unwrap();
        assert_eq!(facts.len(), 1);
        assert!(matches!(facts[0].payload, Payload::Sealed { .. }));
    }
}
