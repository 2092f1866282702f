use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LookupFactsParams {
    #[schemars(description = "Repository the facts apply to")]
    pub repo: String,

    #[schemars(description = "Commit the facts apply to")]
    pub commit: String,

    #[schemars(description = "Fact kind to match exactly")]
    pub kind: String,

    #[schemars(description = "Optional path filter (exact match)")]
    pub path: Option<String>,

    #[schemars(description = "Optional symbol filter (exact match)")]
    pub symbol: Option<String>,

    #[schemars(
        description = "Optional inputs digest for a cache-style exact-hit probe: zero results means miss"
    )]
    pub inputs_hash: Option<String>,
}
