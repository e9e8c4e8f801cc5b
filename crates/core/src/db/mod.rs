//! Trace database access, graph configuration, and output layout.
//!
//! - `TraceDb`: read-only SQLite wrapper over the `vm`, `cap_info` and `elf_sym` tables.
//! - `GraphConfig`: serializable settings (output dir, overlap policy, style).
//! - `OutputLayout`: computed output file paths.
//! - `TraceContext`: config + layout + open database + loaded tables.

mod config;
mod context;
mod layout;
mod models;
mod trace_db;
mod util;

pub use config::{GraphConfig, DEFAULT_OUTPUT_DIR};
pub use context::TraceContext;
pub use layout::OutputLayout;
pub use models::{QueryResult, TraceData};
pub use trace_db::{
    TraceDb, TraceDbError, TraceDbResult, CAP_TABLE, HEAP_BLOCK_PATH, SYM_TABLE, VM_TABLE,
};
pub use util::{load_graph_config, load_graph_config_or_default, open_trace_db, sha256_file};
