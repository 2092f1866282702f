use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::atlas::PolicySource;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CaptureFrameParams {
    #[schemars(description = "Branch the session is working on")]
    pub branch: String,

    #[schemars(description = "Optional ticket id (e.g. 'PAY-42')")]
    pub jira: Option<String>,

    #[schemars(description = "Policy-graph module ids this session touched")]
    pub module_scope: Option<Vec<String>>,

    #[schemars(
        description = "Human-memorable free-text anchor for later fuzzy recall (e.g. 'the payments split before the holidays')"
    )]
    pub reference_point: String,

    #[schemars(description = "One-line summary of the session state")]
    pub summary_caption: String,

    #[schemars(description = "Structured snapshot of build/test/review status")]
    pub status_snapshot: Option<serde_json::Value>,

    #[schemars(description = "Free-form keywords")]
    pub keywords: Option<Vec<String>>,

    #[schemars(
        description = "Optional policy document. When present and resolvable, an Atlas Frame is attached; otherwise the frame is captured without one."
    )]
    pub policy_source: Option<PolicySource>,
}
