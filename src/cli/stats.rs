use anyhow::Result;

use crate::config::WaymarkConfig;

/// Display store statistics in the terminal.
pub fn stats(config: &WaymarkConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path)?;

    let response = crate::store::stats::store_stats(&conn, Some(&db_path))?;

    println!("Waymark Store Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total facts:         {}", response.total_facts);
    println!("  Facts with TTL:      {}", response.facts_with_ttl);
    println!();

    if !response.facts_by_kind.is_empty() {
        println!("By Kind:");
        let mut kinds: Vec<_> = response.facts_by_kind.iter().collect();
        kinds.sort();
        for (kind, count) in kinds {
            println!("  {:<12} {}", kind, count);
        }
        println!();
    }

    println!("Frames:                {}", response.total_frames);
    println!("  with Atlas Frame:    {}", response.frames_with_atlas);
    println!("Atlas Frames:          {}", response.total_atlas_frames);
    println!();

    if response.held_locks.is_empty() {
        println!("Held locks:            none");
    } else {
        println!("Held locks:");
        for name in &response.held_locks {
            println!("  {name}");
        }
    }
    println!("Database size:         {} bytes", response.db_size_bytes);

    Ok(())
}
