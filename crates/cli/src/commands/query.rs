use anyhow::{Context, Result};
use capgraph_core::db::open_trace_db;

use crate::absolute_path;

/// Run a read-only SQL statement against the trace and print rows as JSON.
pub fn query_command(db: &str, sql: &str) -> Result<()> {
    let db_path = absolute_path(db)?;
    let trace = open_trace_db(&db_path)?;
    let result = trace.run_query(sql).with_context(|| format!("Query failed: {sql}"))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
