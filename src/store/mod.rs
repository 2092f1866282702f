//! Storage core: facts, locks, frames, and recall over a shared SQLite
//! connection. All conditional writes are single SQL statements so the
//! absent-check and the write cannot race.

pub mod facts;
pub mod frames;
pub mod locks;
pub mod recall;
pub mod stats;
pub mod types;
