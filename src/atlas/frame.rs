//! Atlas Frame assembly — neighborhood extraction plus policy-edge
//! classification.
//!
//! An Atlas Frame is the architectural explanation attached to a recalled
//! work-session Frame: the bounded module neighborhood around the session's
//! scope, with every caller relationship classified. It is immutable once
//! built; regenerating from an updated policy produces a new id.

use serde::{Deserialize, Serialize};

use crate::atlas::extract::{extract_neighborhood, Neighborhood};
use crate::atlas::policy::{AdjacencyGraph, ModulePolicy, PolicyGraph};
use crate::error::Result;

/// Classification of a directed caller relationship.
///
/// `Unspecified` is a real third state: an edge named in neither the callee's
/// `allowed_callers` nor its `forbidden_callers`. It is never collapsed into
/// forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeRelation {
    Allowed,
    Forbidden,
    Unspecified,
}

/// A directed edge in an Atlas Frame, tagged with its policy classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasEdge {
    pub from: String,
    pub to: String,
    pub relation: EdgeRelation,
}

/// An immutable bounded-neighborhood subgraph generated for a Frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasFrame {
    pub atlas_frame_id: String,
    /// The Frame this atlas was generated for; `None` for standalone
    /// generation.
    pub frame_id: Option<String>,
    pub seed_modules: Vec<String>,
    pub fold_radius: i64,
    pub modules: Vec<ModulePolicy>,
    pub edges: Vec<AtlasEdge>,
}

/// Classify the caller → callee relationship from the callee's policy lists.
/// Forbidden wins when a caller appears in both lists.
fn classify_edge(caller: &str, callee: &ModulePolicy) -> EdgeRelation {
    if callee.forbidden_callers.iter().any(|c| c == caller) {
        EdgeRelation::Forbidden
    } else if callee.allowed_callers.iter().any(|c| c == caller) {
        EdgeRelation::Allowed
    } else {
        EdgeRelation::Unspecified
    }
}

/// Collect and classify every directed relationship inside the neighborhood:
/// adjacency edges between members, plus relationships declared only in the
/// members' policy lists. Deduplicated and sorted by `(from, to)`.
fn classify_edges(
    neighborhood: &Neighborhood,
    graph: &AdjacencyGraph,
    policy: &PolicyGraph,
) -> Vec<AtlasEdge> {
    let mut edges: Vec<AtlasEdge> = Vec::new();

    for (from, to) in graph.iter_edges() {
        if !neighborhood.contains(from) || !neighborhood.contains(to) {
            continue;
        }
        if let Some(callee) = policy.get(to) {
            edges.push(AtlasEdge {
                from: from.to_string(),
                to: to.to_string(),
                relation: classify_edge(from, callee),
            });
        }
    }

    // Policy-declared relationships with no adjacency edge still matter for
    // the "why was this blocked" explanation.
    for member in &neighborhood.modules {
        for caller in &member.forbidden_callers {
            if neighborhood.contains(caller) {
                edges.push(AtlasEdge {
                    from: caller.clone(),
                    to: member.id.clone(),
                    relation: EdgeRelation::Forbidden,
                });
            }
        }
        for caller in &member.allowed_callers {
            if neighborhood.contains(caller) && !member.forbidden_callers.contains(caller) {
                edges.push(AtlasEdge {
                    from: caller.clone(),
                    to: member.id.clone(),
                    relation: EdgeRelation::Allowed,
                });
            }
        }
    }

    edges.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
    edges.dedup();
    edges
}

/// Build an Atlas Frame from seed modules and a fold radius, optionally
/// linked to an existing Frame.
///
/// Pure apart from id generation (UUID v7, so regeneration always yields a
/// fresh identity).
pub fn build_atlas_frame(
    frame_id: Option<&str>,
    seed_modules: &[String],
    fold_radius: i64,
    graph: &AdjacencyGraph,
    policy: &PolicyGraph,
) -> Result<AtlasFrame> {
    let neighborhood = extract_neighborhood(seed_modules, graph, policy, fold_radius)?;
    let edges = classify_edges(&neighborhood, graph, policy);

    Ok(AtlasFrame {
        atlas_frame_id: uuid::Uuid::now_v7().to_string(),
        frame_id: frame_id.map(str::to_string),
        seed_modules: neighborhood.seed_modules.clone(),
        fold_radius: neighborhood.fold_radius,
        modules: neighborhood.modules,
        edges,
    })
}
