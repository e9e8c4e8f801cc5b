use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::db::{open_trace_db, GraphConfig, OutputLayout, TraceData, TraceDb};
use crate::graph::RegionCatalog;

/// Convenience wrapper bundling config, output layout, and the loaded trace.
#[derive(Debug)]
pub struct TraceContext {
    pub config: GraphConfig,
    pub layout: OutputLayout,
    pub db_path: PathBuf,
    pub db: TraceDb,
    pub data: TraceData,
}

impl TraceContext {
    /// Open the trace at `db_path` and load both tables.
    pub fn load(db_path: impl AsRef<Path>, config: GraphConfig) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        let db = open_trace_db(&db_path)?;
        let data = db
            .load()
            .with_context(|| format!("Failed to load trace tables from {}", db_path.display()))?;
        let layout = OutputLayout::new(&config.output_dir);
        Ok(Self { config, layout, db_path, db, data })
    }

    /// Build the region catalog for the loaded memory map.
    pub fn catalog(&self) -> RegionCatalog {
        RegionCatalog::from_entries(&self.data.entries)
    }
}
