use anyhow::Result;

use crate::config::WaymarkConfig;
use crate::store::facts;

/// Run one TTL garbage-collection pass and report what was removed.
pub fn expire(config: &WaymarkConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;

    let now = chrono::Utc::now().timestamp();
    let deleted = facts::expire_facts(&conn, now)?;

    if deleted == 0 {
        println!("No expired facts.");
    } else {
        println!("Deleted {deleted} expired fact(s).");
    }

    Ok(())
}
