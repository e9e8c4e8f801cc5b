use anyhow::{anyhow, Context, Result};
use capgraph_core::db::{TraceDb, HEAP_BLOCK_PATH};
use log::debug;

use crate::{absolute_path, parse_addresses};

/// Rename memory-map rows containing the given heap block addresses.
pub fn tag_heap_command(db: &str, addrs: &[String]) -> Result<usize> {
    if addrs.is_empty() {
        return Err(anyhow!("At least one --addr is required"));
    }
    let blocks = parse_addresses(addrs)?;
    debug!("heap blocks: {:?}", blocks);
    let db_path = absolute_path(db)?;
    let trace = TraceDb::open_writable(&db_path)
        .with_context(|| format!("Failed to open trace database at {}", db_path.display()))?;
    let updated = trace.tag_heap_blocks(&blocks).context("Failed to tag heap blocks")?;

    println!("Tagged {} memory-map row(s) as '{}'", updated, HEAP_BLOCK_PATH);
    Ok(updated)
}
