use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LockParams {
    #[schemars(
        description = "Lock name. Advisory only: no owner, no lease, no expiry — a crashed holder must be released manually."
    )]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UnlockParams {
    #[schemars(description = "Lock name to release")]
    pub name: String,
}
