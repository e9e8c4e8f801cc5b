use std::path::PathBuf;

use anyhow::{Context, Result};
use capgraph_core::db::{OutputLayout, TraceContext};
use capgraph_core::services::{
    resolve_dot_path, write_graph, GraphRequest, GraphvizRenderer, Renderer, WrittenGraph,
};
use log::debug;

use crate::{absolute_path, resolve_graph_config};

/// Options shared by every graph-producing command.
#[derive(Debug, Clone, Default)]
pub struct GraphOptions {
    pub db: String,
    pub config: Option<String>,
    pub out_dir: Option<String>,
    pub overlap: Option<String>,
    /// Fold all permission sets between two nodes into one unlabeled edge.
    pub unlabeled: bool,
    /// Also render the `.gv` with Graphviz in this format (pdf, png, svg, ps).
    pub render: Option<String>,
    pub dot_bin: Option<String>,
}

/// Build one graph from a trace, write it, and optionally render it.
pub fn graph_command(opts: &GraphOptions, request: GraphRequest) -> Result<WrittenGraph> {
    let config = resolve_graph_config(
        opts.config.as_deref(),
        opts.out_dir.as_deref(),
        opts.overlap.as_deref(),
        opts.unlabeled,
    )?;
    debug!("graph config: {:?}", config);
    let db_path = absolute_path(&opts.db)?;
    let ctx = TraceContext::load(&db_path, config)?;
    let written = write_graph(&ctx, &request)?;

    let title = match &request {
        GraphRequest::Regions => "region graph".to_string(),
        GraphRequest::Compartments => "compartment graph".to_string(),
        GraphRequest::Pair { first, second } => format!("{first} vs {second} graph"),
    };
    println!("Wrote {title}:");
    println!("  Nodes: {}", written.nodes);
    println!("  Edges: {}", written.edges);
    println!("  DOT:  {}", written.dot_path.display());
    println!("  JSON: {}", written.json_path.display());

    if let Some(format) = opts.render.as_deref() {
        let renderer = match opts.dot_bin.as_deref() {
            Some(bin) => GraphvizRenderer::new(PathBuf::from(bin)),
            None => GraphvizRenderer::new(resolve_dot_path()),
        };
        let image = OutputLayout::rendered_sibling(&written.dot_path, format);
        renderer
            .render(&written.dot_path, format, &image)
            .with_context(|| format!("Failed to render {}", written.dot_path.display()))?;
        println!("  Rendered ({}): {}", renderer.name(), image.display());
    }

    Ok(written)
}
