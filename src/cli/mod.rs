//! Terminal commands that run against the database directly, outside the MCP
//! server loop.

mod maintenance;
mod stats;

pub use maintenance::expire;
pub use stats::stats;
