use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::store::types::FactScope;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StoreFactParams {
    #[schemars(
        description = "Fact kind: 'repo_scan', 'dep_graph', 'dep_score', 'plan', 'merge_order', 'gate_result', 'artifact', 'note', 'frame', or 'atlas_frame'"
    )]
    pub kind: String,

    #[schemars(description = "Addressable scope: repo, commit, and optional path/symbol")]
    pub scope: FactScope,

    #[schemars(description = "Digest of the inputs that produced this payload")]
    pub inputs_hash: String,

    #[schemars(
        description = "The fact payload. Plain JSON, or {ciphertext, iv} when sealed=true."
    )]
    pub payload: serde_json::Value,

    #[schemars(
        description = "Set true when the payload is caller-encrypted {ciphertext, iv}; the server never decrypts it"
    )]
    pub sealed: Option<bool>,

    #[schemars(description = "Producer's confidence in the observation, 0.0 to 1.0")]
    pub confidence: Option<f64>,

    #[schemars(description = "Seconds until expiry (min 60). Omit for an immortal fact.")]
    pub ttl_seconds: Option<i64>,

    #[schemars(description = "Optional identity of the producing agent")]
    pub actor: Option<String>,

    #[schemars(description = "Fact ids this observation refers to")]
    pub refs: Option<Vec<String>>,
}
