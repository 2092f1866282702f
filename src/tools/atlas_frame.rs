use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::atlas::PolicySource;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GenerateAtlasFrameParams {
    #[schemars(description = "Module ids to expand from; every seed must exist in the policy")]
    pub seed_modules: Vec<String>,

    #[schemars(description = "Number of adjacency hops to expand (0 returns only the seeds)")]
    pub fold_radius: i64,

    #[schemars(description = "Fully-parsed policy document: module metadata plus adjacency edges")]
    pub policy_source: PolicySource,

    #[schemars(description = "Frame id to link the generated Atlas Frame to, if any")]
    pub frame_id: Option<String>,
}
