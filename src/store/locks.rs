//! Named advisory locks.
//!
//! A lock is a row in the `locks` table: present means held. There is no
//! owner token, no lease, and no expiry — a crashed holder leaks the lock
//! until someone releases it. That is the documented reliability contract of
//! an advisory lock; callers wanting timeouts layer them on top.

use rusqlite::{params, Connection};

use crate::error::Result;

/// Try to take the named lock. Returns `true` iff this call created the row.
/// Single atomic conditional insert; never blocks.
pub fn acquire(conn: &Connection, name: &str) -> Result<bool> {
    let now = chrono::Utc::now().timestamp();
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO locks (name, acquired_at) VALUES (?1, ?2)",
        params![name, now],
    )? == 1;
    tracing::debug!(name, acquired = inserted, "lock acquire");
    Ok(inserted)
}

/// Release the named lock. Returns `true` iff a row was actually removed;
/// releasing an unheld lock is a no-op reporting `false`, not an error.
pub fn release(conn: &Connection, name: &str) -> Result<bool> {
    let removed = conn.execute("DELETE FROM locks WHERE name = ?1", params![name])? == 1;
    tracing::debug!(name, released = removed, "lock release");
    Ok(removed)
}
