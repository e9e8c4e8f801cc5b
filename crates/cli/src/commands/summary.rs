use anyhow::Result;
use capgraph_core::db::{GraphConfig, TraceContext};
use capgraph_core::services::{compartment_summary, mapping_summary, permission_histogram};

use crate::absolute_path;

fn load(db: &str) -> Result<TraceContext> {
    TraceContext::load(absolute_path(db)?, GraphConfig::default())
}

/// Capabilities stored in each memory-map entry.
pub fn summary_command(db: &str, json: bool) -> Result<()> {
    let ctx = load(db)?;
    let rows = mapping_summary(&ctx.data.entries, &ctx.data.capabilities);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("Capabilities per mapping ({} total):", ctx.data.capabilities.len());
    if rows.is_empty() {
        println!("  (no mappings)");
    }
    for row in rows {
        let mut attrs = String::new();
        if let Some(prt) = &row.protection {
            attrs.push_str(&format!(" prt={prt}"));
        }
        if let Some(flags) = &row.flags {
            attrs.push_str(&format!(" flags={flags}"));
        }
        if let Some(tp) = &row.vnode_type {
            attrs.push_str(&format!(" tp={tp}"));
        }
        println!(
            "  {} [{} - {}]: total={} ro={} rw={} rx={} rwx={} density={:.2}%{}",
            row.path,
            row.start_addr,
            row.end_addr,
            row.counts.total,
            row.counts.ro,
            row.counts.rw,
            row.counts.rx,
            row.counts.rwx,
            row.density,
            attrs
        );
    }
    Ok(())
}

/// Capabilities crossing each ordered compartment pair.
pub fn compartment_summary_command(db: &str, json: bool) -> Result<()> {
    let ctx = load(db)?;
    let pairs = compartment_summary(&ctx.catalog(), &ctx.data.capabilities);

    if json {
        println!("{}", serde_json::to_string_pretty(&pairs)?);
        return Ok(());
    }

    println!("Capabilities per compartment pair:");
    if pairs.is_empty() {
        println!("  (none)");
    }
    for pair in pairs {
        println!(
            "  {} -> {}: total={} ro={} rw={} rx={} rwx={}",
            pair.src,
            pair.dest,
            pair.counts.total,
            pair.counts.ro,
            pair.counts.rw,
            pair.counts.rx,
            pair.counts.rwx
        );
    }
    Ok(())
}

/// Count of each distinct permission string.
pub fn perms_command(db: &str, json: bool) -> Result<()> {
    let ctx = load(db)?;
    let hist = permission_histogram(&ctx.data.capabilities);

    if json {
        println!("{}", serde_json::to_string_pretty(&hist)?);
        return Ok(());
    }

    println!("Permission sets:");
    if hist.is_empty() {
        println!("  (no capabilities)");
    }
    for entry in hist {
        println!("  {:<12} {}", entry.perms, entry.count);
    }
    Ok(())
}
