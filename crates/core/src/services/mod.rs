//! Higher-level operations over a loaded trace.
//!
//! - `export`: build a graph, write `.gv` and provenance-stamped `.json`.
//! - `render`: turn `.gv` files into images via Graphviz.
//! - `summary`: capability counts per mapping, compartment pair and permission set.
//! - `symbols`: one library's capabilities joined with the ELF symbols at their addresses.

pub mod export;
pub mod render;
pub mod summary;
pub mod symbols;

pub use export::{build_graph, write_graph, GraphExport, GraphRequest, WrittenGraph};
pub use render::{resolve_dot_path, GraphvizRenderer, RenderError, Renderer, RENDER_FORMATS};
pub use summary::{
    compartment_summary, mapping_summary, permission_histogram, CompartmentPairSummary,
    MappingSummary, PermCount, PermCounts,
};
pub use symbols::{capability_symbols, CapabilitySymbols, SymbolRef, SymbolReport};
