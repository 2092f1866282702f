//! Module policy graph and adjacency graph types.
//!
//! A policy source arrives fully parsed from the caller — the core never
//! fetches or watches policy files. Module ids are the only cross-reference
//! vocabulary; there is no alias resolution at this layer.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Per-module policy metadata. Every optional array defaults to empty so
/// downstream consumers never see an omitted field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModulePolicy {
    pub id: String,
    /// Free-form placement coordinates (e.g. layer/ring) for rendering.
    #[serde(default)]
    pub coordinates: serde_json::Value,
    #[serde(default)]
    pub allowed_callers: Vec<String>,
    #[serde(default)]
    pub forbidden_callers: Vec<String>,
    #[serde(default)]
    pub feature_flags: Vec<String>,
    #[serde(default)]
    pub requires_permissions: Vec<String>,
    #[serde(default)]
    pub kill_patterns: Vec<String>,
}

/// Policy metadata indexed by module id.
#[derive(Debug, Clone, Default)]
pub struct PolicyGraph {
    modules: HashMap<String, ModulePolicy>,
}

impl PolicyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module policy. Re-registering an id replaces its metadata.
    pub fn insert(&mut self, policy: ModulePolicy) {
        self.modules.insert(policy.id.clone(), policy);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&ModulePolicy> {
        self.modules.get(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Directed module adjacency: id → neighbor ids. Edges may reference modules
/// the policy does not know about; membership filtering happens during
/// extraction, not here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdjacencyGraph {
    edges: HashMap<String, Vec<String>>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.edges.entry(from.into()).or_default().push(to.into());
    }

    /// Outgoing neighbors of `id`, empty when the node has no edges.
    pub fn neighbors(&self, id: &str) -> &[String] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All directed edges, for edge classification passes.
    pub fn iter_edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges
            .iter()
            .flat_map(|(from, tos)| tos.iter().map(move |to| (from.as_str(), to.as_str())))
    }
}

/// A fully-parsed policy document: adjacency plus per-module metadata.
///
/// This is the wire shape the external collaborator supplies through the tool
/// layer; [`PolicySource::into_parts`] splits it for the extractor.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct PolicySource {
    #[serde(default)]
    pub modules: Vec<ModulePolicy>,
    /// Directed edges as `[from, to]` pairs.
    #[serde(default)]
    pub edges: Vec<(String, String)>,
}

impl PolicySource {
    pub fn into_parts(self) -> (AdjacencyGraph, PolicyGraph) {
        let mut graph = AdjacencyGraph::new();
        for (from, to) in self.edges {
            graph.add_edge(from, to);
        }
        let mut policy = PolicyGraph::new();
        for module in self.modules {
            policy.insert(module);
        }
        (graph, policy)
    }
}
