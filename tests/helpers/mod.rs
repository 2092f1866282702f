#![allow(dead_code)]

use rusqlite::Connection;
use waymark::store::facts::{FactDraft, FactLimits};
use waymark::store::types::{FactKind, FactScope, Payload};

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    waymark::db::schema::init_schema(&conn).unwrap();
    waymark::db::migrations::run_migrations(&conn).unwrap();
    conn
}

/// Default limits used across the integration suites.
pub fn test_limits() -> FactLimits {
    FactLimits {
        max_payload_bytes: 65_536,
        max_ttl_seconds: 2_592_000,
    }
}

/// A note fact scoped to `repo@commit` with the given payload.
pub fn note_draft(repo: &str, commit: &str, payload: serde_json::Value) -> FactDraft {
    FactDraft {
        kind: FactKind::Note,
        scope: FactScope {
            repo: repo.into(),
            commit: commit.into(),
            path: None,
            symbol: None,
        },
        inputs_hash: "inputs-0".into(),
        payload: Payload::Plain(payload),
        confidence: None,
        actor: Some("test-agent".into()),
        refs: vec![],
        ttl_seconds: None,
    }
}

/// A policy source with a small layered topology:
/// `ui → api → core → db`, plus `jobs → core`; `core` allows api,
/// forbids ui; `db` allows core only.
pub fn layered_policy() -> waymark::atlas::PolicySource {
    serde_json::from_value(serde_json::json!({
        "modules": [
            {"id": "ui", "coordinates": {"layer": 0}},
            {"id": "api", "coordinates": {"layer": 1}},
            {
                "id": "core",
                "coordinates": {"layer": 2},
                "allowed_callers": ["api", "jobs"],
                "forbidden_callers": ["ui"],
            },
            {"id": "db", "coordinates": {"layer": 3}, "allowed_callers": ["core"]},
            {"id": "jobs", "coordinates": {"layer": 1}},
        ],
        "edges": [
            ["ui", "api"],
            ["api", "core"],
            ["core", "db"],
            ["jobs", "core"],
        ],
    }))
    .unwrap()
}
