//! Region resolution and edge aggregation.
//!
//! Pipeline, leaves first:
//! - `catalog`: memory-map rows grouped into logical regions and compartments.
//! - `identity`: canonical region identity (section suffixes, pseudo mappings).
//! - `resolver`: address → containing regions, path → compartment.
//! - `aggregate`: capabilities → deduplicated, weighted edges.
//! - `assemble`: nodes and edges for the renderer.
//! - `dot`: Graphviz text for an assembled graph.

pub mod aggregate;
pub mod assemble;
pub mod catalog;
pub mod dot;
pub mod identity;
pub mod resolver;

pub use aggregate::{
    accumulate_weight, aggregate, weight_after, Attribution, CompartmentAttribution, Edge,
    EdgeAggregator, EdgeLabel, PairAttribution, RegionAttribution, INITIAL_WEIGHT,
};
pub use assemble::{
    compartment_graph, pair_graph, region_graph, Graph, GraphEdge, GraphKind, GraphStyle, Node,
};
pub use catalog::{Interval, Region, RegionCatalog};
pub use dot::render_dot;
pub use identity::{canonical_path, identity_equivalent, PseudoKind, RegionId, SECTION_SUFFIXES};
pub use resolver::{ContainmentResolver, Hit, OverlapPolicy};
