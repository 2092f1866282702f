use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecallFrameParams {
    #[schemars(description = "Exact frame id (highest priority)")]
    pub frame_id: Option<String>,

    #[schemars(description = "Fuzzy reference point text (second priority)")]
    pub reference_point: Option<String>,

    #[schemars(description = "Exact ticket id; most recent matching frame wins (lowest priority)")]
    pub jira: Option<String>,
}
