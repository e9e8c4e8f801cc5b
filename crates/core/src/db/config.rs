use serde::{Deserialize, Serialize};

use crate::graph::{EdgeLabel, GraphStyle, OverlapPolicy};

/// Default directory (relative to the working directory) for graph artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "graph-output";

/// Serializable settings for graph generation.
///
/// Every field is optional in the file; missing keys fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Directory receiving `.gv` and `.json` outputs.
    pub output_dir: String,
    /// How addresses covered by several regions are attributed.
    pub overlap_policy: OverlapPolicy,
    /// `permissions` (default) or `unlabeled`, which folds every permission
    /// set between two nodes into one edge.
    pub edge_label: EdgeLabel,
    pub style: GraphStyle,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            overlap_policy: OverlapPolicy::default(),
            edge_label: EdgeLabel::default(),
            style: GraphStyle::default(),
        }
    }
}

impl GraphConfig {
    /// Builder-style override for the output directory.
    pub fn with_output_dir(mut self, output_dir: impl Into<String>) -> Self {
        self.output_dir = output_dir.into();
        self
    }
}
