use std::path::{Path, PathBuf};

/// Output file locations for one run.
///
/// Derived from the output directory only; it does *not* touch the filesystem.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub root: PathBuf,
    /// Region graph (`graph_overview.gv`).
    pub overview_path: PathBuf,
    /// Compartment graph (`comparts_graph.gv`).
    pub compartments_path: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let overview_path = root.join("graph_overview.gv");
        let compartments_path = root.join("comparts_graph.gv");
        Self { root, overview_path, compartments_path }
    }

    /// Graph file for a library pair, e.g. `libfoo_vs_libbar.gv`.
    ///
    /// Path separators in the patterns are replaced so the file stays in `root`.
    pub fn pair_path(&self, first: &str, second: &str) -> PathBuf {
        let name = format!("{}_vs_{}.gv", file_component(first), file_component(second));
        self.root.join(name)
    }

    /// JSON export written next to a `.gv` file.
    pub fn json_sibling(path: &Path) -> PathBuf {
        path.with_extension("json")
    }

    /// Rendered image written next to a `.gv` file.
    pub fn rendered_sibling(path: &Path, format: &str) -> PathBuf {
        path.with_extension(format)
    }
}

fn file_component(pattern: &str) -> String {
    let cleaned: String = pattern
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_whitespace() { '_' } else { c })
        .collect();
    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        "lib".to_string()
    } else {
        trimmed.to_string()
    }
}
