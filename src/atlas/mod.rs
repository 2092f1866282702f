//! Module policy graphs and bounded-neighborhood ("Atlas Frame") extraction.

pub mod extract;
pub mod frame;
pub mod policy;

pub use extract::{extract_neighborhood, Neighborhood};
pub use frame::{build_atlas_frame, AtlasEdge, AtlasFrame, EdgeRelation};
pub use policy::{AdjacencyGraph, ModulePolicy, PolicyGraph, PolicySource};
