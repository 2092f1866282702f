//! Core record type definitions.
//!
//! Defines [`FactKind`] (the closed fact vocabulary), [`FactScope`] (the
//! addressable context a fact applies to), [`Payload`] (plain or sealed
//! content), [`Fact`], and [`Frame`] (a work-session snapshot).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The closed set of fact kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    RepoScan,
    DepGraph,
    DepScore,
    Plan,
    MergeOrder,
    GateResult,
    Artifact,
    Note,
    Frame,
    AtlasFrame,
}

impl FactKind {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RepoScan => "repo_scan",
            Self::DepGraph => "dep_graph",
            Self::DepScore => "dep_score",
            Self::Plan => "plan",
            Self::MergeOrder => "merge_order",
            Self::GateResult => "gate_result",
            Self::Artifact => "artifact",
            Self::Note => "note",
            Self::Frame => "frame",
            Self::AtlasFrame => "atlas_frame",
        }
    }
}

impl std::fmt::Display for FactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "repo_scan" => Ok(Self::RepoScan),
            "dep_graph" => Ok(Self::DepGraph),
            "dep_score" => Ok(Self::DepScore),
            "plan" => Ok(Self::Plan),
            "merge_order" => Ok(Self::MergeOrder),
            "gate_result" => Ok(Self::GateResult),
            "artifact" => Ok(Self::Artifact),
            "note" => Ok(Self::Note),
            "frame" => Ok(Self::Frame),
            "atlas_frame" => Ok(Self::AtlasFrame),
            _ => Err(format!("unknown fact kind: {s}")),
        }
    }
}

/// The addressable context a fact applies to.
///
/// `repo` and `commit` are always present; `path` and `symbol` narrow the
/// scope when the observation is file- or symbol-level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FactScope {
    pub repo: String,
    pub commit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// Fact payload — plain JSON or caller-encrypted.
///
/// The sealed variant is opaque to the server: it is hashed and stored as-is
/// and never decrypted. The distinction is resolved once at the API boundary;
/// storage keeps an explicit sealed flag alongside the blob, so a plain
/// payload that happens to carry `ciphertext`/`iv` keys reads back as plain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Sealed { ciphertext: String, iv: String },
    Plain(serde_json::Value),
}

/// An immutable, content-addressed observation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    /// Digest over `(kind, scope, inputs_hash, payload_hash)`.
    pub fact_id: String,
    pub kind: FactKind,
    pub scope: FactScope,
    /// Caller-supplied digest of the inputs that produced the payload.
    pub inputs_hash: String,
    pub payload: Payload,
    /// Digest of the canonical payload encoding.
    pub payload_hash: String,
    /// Producer's confidence in the observation, `0.0..=1.0`.
    pub confidence: Option<f64>,
    /// Who produced the observation, if known.
    pub actor: Option<String>,
    /// Fact ids this observation refers to.
    pub refs: Vec<String>,
    /// Seconds until expiry; `None` means immortal.
    pub ttl_seconds: Option<i64>,
    /// Unix seconds at insert time.
    pub created_at: i64,
}

/// A work-session snapshot, keyed by id and replaceable on correction.
///
/// `atlas_frame_id` links to at most one Atlas Frame; absence is a valid
/// terminal state when no policy source was available at capture time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub id: String,
    /// ISO 8601 capture timestamp.
    pub timestamp: String,
    pub branch: String,
    pub jira: Option<String>,
    /// Policy-graph module ids this session touched.
    pub module_scope: Vec<String>,
    /// Human-memorable free-text anchor for fuzzy recall.
    pub reference_point: String,
    pub summary_caption: String,
    pub status_snapshot: serde_json::Value,
    pub keywords: Vec<String>,
    pub atlas_frame_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_kind_round_trips_through_str() {
        for kind in [
            FactKind::RepoScan,
            FactKind::DepGraph,
            FactKind::DepScore,
            FactKind::Plan,
            FactKind::MergeOrder,
            FactKind::GateResult,
            FactKind::Artifact,
            FactKind::Note,
            FactKind::Frame,
            FactKind::AtlasFrame,
        ] {
            assert_eq!(kind.as_str().parse::<FactKind>().unwrap(), kind);
        }
        assert!("nope".parse::<FactKind>().is_err());
    }

    #[test]
    fn sealed_payload_deserializes_from_shape() {
        let v = serde_json::json!({"ciphertext": "abc", "iv": "0102"});
        let payload: Payload = serde_json::from_value(v).unwrap();
        assert!(matches!(payload, Payload::Sealed { .. }));
    }

    #[test]
    fn plain_payload_deserializes_from_arbitrary_json() {
        let v = serde_json::json!({"anything": [1, 2, 3]});
        let payload: Payload = serde_json::from_value(v).unwrap();
        assert!(matches!(payload, Payload::Plain(_)));
    }
}
