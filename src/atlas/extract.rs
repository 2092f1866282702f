//! Bounded neighborhood extraction over the module policy graph.
//!
//! Breadth-first expansion from a seed set, level by level, for exactly
//! `fold_radius` levels. Policy membership is the source of truth: adjacency
//! edges pointing at modules the policy does not know are dropped silently.
//! Expansion saturates — a level that adds nothing ends it early, so any
//! radius at or past the component's diameter from the seeds produces
//! identical output.

use std::collections::HashSet;

use serde::Serialize;

use crate::atlas::policy::{AdjacencyGraph, ModulePolicy, PolicyGraph};
use crate::error::{Result, WaymarkError};

/// A deterministic bounded subgraph: seeds plus everything within
/// `fold_radius` hops, sorted lexicographically by module id.
#[derive(Debug, Clone, Serialize)]
pub struct Neighborhood {
    pub seed_modules: Vec<String>,
    pub fold_radius: i64,
    pub modules: Vec<ModulePolicy>,
}

impl Neighborhood {
    /// Module ids in output order.
    pub fn module_ids(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.iter().any(|m| m.id == id)
    }
}

/// Pure function of its inputs; no side effects.
pub fn extract_neighborhood(
    seed_modules: &[String],
    graph: &AdjacencyGraph,
    policy: &PolicyGraph,
    fold_radius: i64,
) -> Result<Neighborhood> {
    if seed_modules.is_empty() {
        return Err(WaymarkError::EmptySeed);
    }
    if fold_radius < 0 {
        return Err(WaymarkError::InvalidRadius(fold_radius));
    }
    for seed in seed_modules {
        if !policy.contains(seed) {
            return Err(WaymarkError::UnknownModule(seed.clone()));
        }
    }

    let mut included: HashSet<String> = seed_modules.iter().cloned().collect();
    let mut frontier: Vec<String> = included.iter().cloned().collect();

    for _ in 0..fold_radius {
        let mut next_frontier: Vec<String> = Vec::new();
        for module in &frontier {
            for neighbor in graph.neighbors(module) {
                if included.contains(neighbor) || !policy.contains(neighbor) {
                    continue;
                }
                included.insert(neighbor.clone());
                next_frontier.push(neighbor.clone());
            }
        }
        // Saturated: the component is exhausted before the radius is
        if next_frontier.is_empty() {
            break;
        }
        frontier = next_frontier;
    }

    let mut ids: Vec<String> = included.into_iter().collect();
    ids.sort();

    let modules = ids
        .iter()
        .filter_map(|id| policy.get(id).cloned())
        .collect();

    Ok(Neighborhood {
        seed_modules: seed_modules.to_vec(),
        fold_radius,
        modules,
    })
}
