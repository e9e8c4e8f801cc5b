use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};

use crate::db::{sha256_file, GraphConfig, OutputLayout, TraceContext};
use crate::graph::{
    compartment_graph, pair_graph, region_graph, render_dot, Graph, OverlapPolicy, RegionCatalog,
};
use crate::model::Capability;

/// Which graph to build from a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphRequest {
    Regions,
    Compartments,
    Pair { first: String, second: String },
}

impl GraphRequest {
    /// Destination `.gv` path for this request under `layout`.
    pub fn output_path(&self, layout: &OutputLayout) -> PathBuf {
        match self {
            GraphRequest::Regions => layout.overview_path.clone(),
            GraphRequest::Compartments => layout.compartments_path.clone(),
            GraphRequest::Pair { first, second } => layout.pair_path(first, second),
        }
    }
}

/// Build the requested graph from a catalog and capability list.
pub fn build_graph(
    catalog: &RegionCatalog,
    caps: &[Capability],
    request: &GraphRequest,
    config: &GraphConfig,
) -> Graph {
    let policy = config.overlap_policy;
    let label = config.edge_label;
    match request {
        GraphRequest::Regions => region_graph(catalog, caps, policy, label, &config.style),
        GraphRequest::Compartments => {
            compartment_graph(catalog, caps, policy, label, &config.style)
        }
        GraphRequest::Pair { first, second } => {
            pair_graph(catalog, caps, first, second, policy, label, &config.style)
        }
    }
}

/// JSON export of a graph with provenance of the trace it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    pub generated_at: String,
    pub database: String,
    pub database_sha256: String,
    pub overlap_policy: OverlapPolicy,
    pub graph: Graph,
}

impl GraphExport {
    pub fn new(graph: Graph, db_path: &Path, overlap_policy: OverlapPolicy) -> Result<Self> {
        Ok(Self {
            generated_at: Utc::now().to_rfc3339(),
            database: db_path.display().to_string(),
            database_sha256: sha256_file(db_path)?,
            overlap_policy,
            graph,
        })
    }
}

/// Files produced for one graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenGraph {
    pub dot_path: PathBuf,
    pub json_path: PathBuf,
    pub nodes: usize,
    pub edges: usize,
}

/// Build `request` from a loaded trace and write its `.gv` and `.json` files.
///
/// The output directory is created if missing.
pub fn write_graph(ctx: &TraceContext, request: &GraphRequest) -> Result<WrittenGraph> {
    let catalog = ctx.catalog();
    let graph = build_graph(&catalog, &ctx.data.capabilities, request, &ctx.config);

    std::fs::create_dir_all(&ctx.layout.root).with_context(|| {
        format!("Failed to create output directory {}", ctx.layout.root.display())
    })?;

    let dot_path = request.output_path(&ctx.layout);
    let dot = render_dot(&graph, &ctx.config.style);
    std::fs::write(&dot_path, dot)
        .with_context(|| format!("Failed to write graph to {}", dot_path.display()))?;

    let nodes = graph.nodes.len();
    let edges = graph.edges.len();
    let export = GraphExport::new(graph, &ctx.db_path, ctx.config.overlap_policy)?;
    let json_path = OutputLayout::json_sibling(&dot_path);
    let json = serde_json::to_string_pretty(&export).context("Failed to serialize graph export")?;
    std::fs::write(&json_path, json)
        .with_context(|| format!("Failed to write graph export to {}", json_path.display()))?;

    info!("wrote {} ({} nodes, {} edges)", dot_path.display(), nodes, edges);
    Ok(WrittenGraph { dot_path, json_path, nodes, edges })
}
