//! capgraph-core
//!
//! Core library for analysing CHERI capability traces.
//!
//! A trace is a SQLite database holding the traced process's memory map and
//! every capability found in memory. This crate groups mappings into logical
//! regions and compartments, attributes each capability to the region that
//! holds it and the regions it points into, and aggregates those into
//! weighted graphs ready for Graphviz.
//!
//! All substantive logic lives here so the CLI stays a thin frontend.

pub mod db;
pub mod graph;
pub mod model;
pub mod services;

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
