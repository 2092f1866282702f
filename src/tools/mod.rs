pub mod atlas_frame;
pub mod capture_frame;
pub mod lookup_facts;
pub mod locks;
pub mod recall_frame;
pub mod store_fact;

use atlas_frame::GenerateAtlasFrameParams;
use capture_frame::CaptureFrameParams;
use lookup_facts::LookupFactsParams;
use locks::{LockParams, UnlockParams};
use recall_frame::RecallFrameParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use store_fact::StoreFactParams;

use crate::atlas;
use crate::config::WaymarkConfig;
use crate::store::facts::{self, FactDraft, FactFilter};
use crate::store::frames::{self, FrameDraft};
use crate::store::locks as lock_table;
use crate::store::recall::{self, RecallQuery};
use crate::store::types::{FactKind, Payload};

/// The Waymark MCP tool handler. Holds shared state (db connection, config)
/// and exposes all MCP tools via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct WaymarkTools {
    tool_router: ToolRouter<Self>,
    db: Arc<Mutex<Connection>>,
    config: Arc<WaymarkConfig>,
}

#[tool_router]
impl WaymarkTools {
    pub fn new(db: Arc<Mutex<Connection>>, config: Arc<WaymarkConfig>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            db,
            config,
        }
    }

    /// Run a closure against the shared connection on the blocking pool.
    async fn with_db<T, F>(&self, f: F) -> Result<T, String>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> crate::error::Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|e| format!("db lock poisoned: {e}"))?;
            f(&conn).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| format!("db task failed: {e}"))?
    }

    /// Store an immutable content-addressed fact.
    #[tool(description = "Store an immutable fact keyed by content hash. Re-submitting an identical fact succeeds with inserted=false.")]
    async fn store_fact(
        &self,
        Parameters(params): Parameters<StoreFactParams>,
    ) -> Result<String, String> {
        let kind: FactKind = params.kind.parse().map_err(|e: String| e)?;

        let payload = if params.sealed.unwrap_or(false) {
            serde_json::from_value::<Payload>(params.payload.clone())
                .ok()
                .filter(|p| matches!(p, Payload::Sealed { .. }))
                .ok_or("sealed payload must be an object with 'ciphertext' and 'iv'")?
        } else {
            Payload::Plain(params.payload)
        };

        let draft = FactDraft {
            kind,
            scope: params.scope,
            inputs_hash: params.inputs_hash,
            payload,
            confidence: params.confidence,
            actor: params.actor,
            refs: params.refs.unwrap_or_default(),
            ttl_seconds: params.ttl_seconds,
        };

        tracing::info!(kind = %kind, repo = %draft.scope.repo, "store_fact called");

        let limits = self.config.fact_limits();
        let result = self
            .with_db(move |conn| facts::put_fact(conn, &draft, &limits))
            .await?;

        serde_json::to_string(&result).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Look up facts by exact-match scope filters.
    #[tool(description = "Look up facts by repo, commit, and kind, optionally narrowed by path, symbol, or inputs_hash. Filters are conjunctive; zero results is a cache miss, not an error.")]
    async fn lookup_facts(
        &self,
        Parameters(params): Parameters<LookupFactsParams>,
    ) -> Result<String, String> {
        let kind: FactKind = params.kind.parse().map_err(|e: String| e)?;
        let filter = FactFilter {
            repo: params.repo,
            commit: params.commit,
            kind,
            path: params.path,
            symbol: params.symbol,
            inputs_hash: params.inputs_hash,
        };

        let results = self
            .with_db(move |conn| facts::get_facts(conn, &filter))
            .await?;

        let count = results.len();
        serde_json::to_string(&serde_json::json!({
            "facts": results,
            "count": count,
        }))
        .map_err(|e| format!("serialization failed: {e}"))
    }

    /// Acquire a named advisory lock.
    #[tool(description = "Try to acquire a named advisory lock. Returns ok=true iff this caller took it. Never blocks; no lease or expiry.")]
    async fn lock(&self, Parameters(params): Parameters<LockParams>) -> Result<String, String> {
        let name = params.name;
        let ok = self
            .with_db(move |conn| lock_table::acquire(conn, &name))
            .await?;
        Ok(serde_json::json!({"ok": ok}).to_string())
    }

    /// Release a named advisory lock.
    #[tool(description = "Release a named advisory lock. Returns ok=true iff a lock was actually held.")]
    async fn unlock(&self, Parameters(params): Parameters<UnlockParams>) -> Result<String, String> {
        let name = params.name;
        let ok = self
            .with_db(move |conn| lock_table::release(conn, &name))
            .await?;
        Ok(serde_json::json!({"ok": ok}).to_string())
    }

    /// Generate and persist an Atlas Frame from a policy document.
    #[tool(description = "Build a bounded neighborhood of the module policy graph from seed modules and a fold radius, classify its edges, and persist it as an immutable Atlas Frame.")]
    async fn generate_atlas_frame(
        &self,
        Parameters(params): Parameters<GenerateAtlasFrameParams>,
    ) -> Result<String, String> {
        let (graph, policy) = params.policy_source.into_parts();
        let frame_id = params.frame_id;
        let seeds = params.seed_modules;
        let radius = params.fold_radius;

        tracing::info!(seeds = seeds.len(), radius, "generate_atlas_frame called");

        let atlas = self
            .with_db(move |conn| {
                let atlas =
                    atlas::build_atlas_frame(frame_id.as_deref(), &seeds, radius, &graph, &policy)?;
                frames::persist_atlas_frame(conn, &atlas)?;
                Ok(atlas)
            })
            .await?;

        serde_json::to_string(&atlas).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Capture a work-session snapshot.
    #[tool(description = "Capture a work-session Frame. If a policy document is supplied and the module scope resolves, an Atlas Frame is attached; otherwise the frame is captured without one.")]
    async fn capture_frame(
        &self,
        Parameters(params): Parameters<CaptureFrameParams>,
    ) -> Result<String, String> {
        if params.reference_point.is_empty() {
            return Err("reference_point must not be empty".into());
        }

        let draft = FrameDraft {
            branch: params.branch,
            jira: params.jira,
            module_scope: params.module_scope.unwrap_or_default(),
            reference_point: params.reference_point,
            summary_caption: params.summary_caption,
            status_snapshot: params.status_snapshot.unwrap_or(serde_json::Value::Null),
            keywords: params.keywords.unwrap_or_default(),
        };
        let policy_source = params.policy_source;
        let radius = self.config.atlas.default_fold_radius;

        let frame = self
            .with_db(move |conn| frames::capture_frame(conn, &draft, policy_source, radius))
            .await?;

        serde_json::to_string(&frame).map_err(|e| format!("serialization failed: {e}"))
    }

    /// Recall a frame by id, reference point, or ticket.
    #[tool(description = "Recall a work-session Frame. Priority: frame_id (exact) > reference_point (fuzzy) > jira (exact, most recent). Returns the frame plus its Atlas Frame when still stored.")]
    async fn recall_frame(
        &self,
        Parameters(params): Parameters<RecallFrameParams>,
    ) -> Result<String, String> {
        let query = RecallQuery {
            frame_id: params.frame_id,
            reference_point: params.reference_point,
            jira: params.jira,
        };

        let result = self
            .with_db(move |conn| recall::recall(conn, &query))
            .await?;

        serde_json::to_string(&result).map_err(|e| format!("serialization failed: {e}"))
    }
}

#[tool_handler]
impl ServerHandler for WaymarkTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Waymark is a knowledge-persistence server for coding agents. Use store_fact \
                 and lookup_facts for content-addressed observations, lock/unlock for advisory \
                 mutual exclusion, capture_frame to snapshot a work session, and recall_frame \
                 to get back to it later."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
