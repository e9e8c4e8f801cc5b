use serde::{Deserialize, Serialize};

use crate::model::{Capability, MemoryMapEntry};

/// Both trace tables, materialized in row order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceData {
    pub entries: Vec<MemoryMapEntry>,
    pub capabilities: Vec<Capability>,
}

impl TraceData {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.capabilities.is_empty()
    }
}

/// Rows returned by a passthrough query.
///
/// Cells keep their SQLite storage class: integers and reals become JSON
/// numbers, text stays text, blobs are hex-encoded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}
