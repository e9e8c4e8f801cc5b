use anyhow::{Context, Result};
use capgraph_core::db::open_trace_db;
use capgraph_core::services::{capability_symbols, SymbolReport};
use log::debug;

use crate::absolute_path;

const NOT_FOUND: &str = "SYM NOT FOUND";

/// Capabilities stored in `lib` with the symbols at their location and target.
pub fn symbols_command(db: &str, lib: &str, json: bool) -> Result<SymbolReport> {
    let db_path = absolute_path(db)?;
    let trace = open_trace_db(&db_path)?;
    let caps = trace.load_capabilities().context("Failed to load capabilities")?;
    let symbols = trace.load_symbols().context("Failed to load symbols")?;
    debug!("{} capabilities, {} symbols", caps.len(), symbols.len());

    let report = capability_symbols(&caps, &symbols, lib);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(report);
    }

    println!("{} - total number of caps: {}", report.library, report.total());
    println!(
        "  {:<18} {:<40} {:<48} {}",
        "CAP_LOC", "CAP_LOC_SYM (TYPE)", "CAP_INFO", "CAP_SYM (TYPE)"
    );
    for cap in &report.capabilities {
        let info = format!("{}[{},{}-{}]", cap.target_addr, cap.perms, cap.base, cap.top);
        let target = cap.target_symbol.as_ref().map(|s| s.display());
        let target = target.as_deref().unwrap_or(NOT_FOUND);
        if cap.location_symbols.is_empty() {
            println!("  {:<18} {:<40} {:<48} {}", cap.location_addr, NOT_FOUND, info, target);
        }
        for sym in &cap.location_symbols {
            println!("  {:<18} {:<40} {:<48} {}", cap.location_addr, sym.display(), info, target);
        }
    }
    Ok(report)
}
