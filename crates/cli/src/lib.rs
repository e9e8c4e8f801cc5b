pub mod commands;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use capgraph_core::db::{load_graph_config_or_default, GraphConfig};
use capgraph_core::graph::{EdgeLabel, OverlapPolicy};
use capgraph_core::model::Address;

/// Resolve a possibly-relative path against the current working directory.
pub fn absolute_path(path: &str) -> Result<PathBuf> {
    let p = Path::new(path);
    if p.is_absolute() {
        Ok(p.to_path_buf())
    } else {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        Ok(cwd.join(p))
    }
}

/// Load the graph config (if any) and apply command-line overrides on top.
pub fn resolve_graph_config(
    config: Option<&str>,
    out_dir: Option<&str>,
    overlap: Option<&str>,
    unlabeled: bool,
) -> Result<GraphConfig> {
    let mut cfg = load_graph_config_or_default(config.map(Path::new))?;
    if let Some(dir) = out_dir {
        cfg.output_dir = dir.to_string();
    }
    if let Some(policy) = overlap {
        cfg.overlap_policy = validate_overlap_policy(policy)?;
    }
    if unlabeled {
        cfg.edge_label = EdgeLabel::Unlabeled;
    }
    Ok(cfg)
}

pub fn validate_overlap_policy(policy: &str) -> Result<OverlapPolicy> {
    policy.parse::<OverlapPolicy>().map_err(|e| anyhow!(e))
}

/// Parse heap block addresses given on the command line.
pub fn parse_addresses(raw: &[String]) -> Result<Vec<Address>> {
    raw.iter()
        .map(|s| Address::parse(s).with_context(|| format!("Invalid heap block address '{s}'")))
        .collect()
}
