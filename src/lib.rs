//! Knowledge persistence for AI coding assistants — content-addressed facts,
//! advisory locks, and architectural recall via MCP.
//!
//! Waymark is an [MCP](https://modelcontextprotocol.io/) server that gives
//! coding agents durable cross-session memory with three distinct record
//! shapes:
//!
//! | Record | Identity | Mutability | Expiry |
//! |--------|----------|------------|--------|
//! | **Fact** | content hash | write-once, idempotent | TTL-governed |
//! | **Frame** | caller id | last-write-wins | none |
//! | **Atlas Frame** | generated id | immutable blob | none |
//!
//! A Fact is any observation worth caching — a repo scan, a dependency
//! score, a gate result — addressed by the digest of its kind, scope,
//! inputs, and payload so duplicate submissions collapse into one row. A
//! Frame is a work-session snapshot recalled later through a fuzzy
//! "reference point" phrase. An Atlas Frame is the bounded neighborhood of a
//! module policy graph around the session's scope, so a recalled Frame
//! arrives with its architectural context attached.
//!
//! # Architecture
//!
//! - **Storage**: SQLite in WAL mode; every conditional write is a single
//!   atomic statement
//! - **Identity**: canonical-JSON SHA-256 digests (key order never matters)
//! - **Transport**: MCP over stdio (primary) or Streamable HTTP/SSE
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite database initialization, schema, and migrations
//! - [`hash`] — Canonical JSON hashing for fact identity
//! - [`store`] — Facts, advisory locks, frames, and recall
//! - [`atlas`] — Policy graphs and bounded-neighborhood extraction

pub mod atlas;
pub mod config;
pub mod db;
pub mod error;
pub mod hash;
pub mod store;
