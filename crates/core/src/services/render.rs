use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Graph source not found at {0}")]
    MissingSource(PathBuf),
    #[error("Unsupported output format '{0}'")]
    UnsupportedFormat(String),
    #[error("Graph renderer error: {0}")]
    Renderer(String),
}

/// Output formats accepted by `dot -T`.
pub const RENDER_FORMATS: &[&str] = &["pdf", "png", "svg", "ps"];

/// Turns a `.gv` file into an image.
pub trait Renderer {
    fn render(&self, source: &Path, format: &str, output: &Path) -> Result<(), RenderError>;
    fn name(&self) -> &'static str;
}

/// Shells out to Graphviz `dot`.
#[derive(Debug, Clone)]
pub struct GraphvizRenderer {
    pub dot_bin: PathBuf,
}

impl Default for GraphvizRenderer {
    fn default() -> Self {
        Self { dot_bin: resolve_dot_path() }
    }
}

impl GraphvizRenderer {
    pub fn new(dot_bin: impl Into<PathBuf>) -> Self {
        Self { dot_bin: dot_bin.into() }
    }
}

impl Renderer for GraphvizRenderer {
    fn render(&self, source: &Path, format: &str, output: &Path) -> Result<(), RenderError> {
        if !source.is_file() {
            return Err(RenderError::MissingSource(source.to_path_buf()));
        }
        if !RENDER_FORMATS.contains(&format) {
            return Err(RenderError::UnsupportedFormat(format.to_string()));
        }

        debug!("rendering {} -> {} via {}", source.display(), output.display(), self.dot_bin.display());
        let output_status = Command::new(&self.dot_bin)
            .arg(format!("-T{format}"))
            .arg("-o")
            .arg(output)
            .arg(source)
            .output()
            .map_err(|e| RenderError::Renderer(format!("failed to spawn dot: {e}")))?;
        if !output_status.status.success() {
            let stderr = String::from_utf8_lossy(&output_status.stderr);
            return Err(RenderError::Renderer(format!(
                "dot exited with {}: {}",
                output_status.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "graphviz"
    }
}

/// `CAPGRAPH_DOT_BIN` if set, else `dot` on `PATH`.
pub fn resolve_dot_path() -> PathBuf {
    std::env::var_os("CAPGRAPH_DOT_BIN").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("dot"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_source_is_reported_before_spawning() {
        let renderer = GraphvizRenderer::new("/nonexistent/dot");
        let err = renderer
            .render(Path::new("/nonexistent/graph.gv"), "pdf", Path::new("/tmp/out.pdf"))
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingSource(_)));
    }

    #[test]
    fn unknown_format_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("g.gv");
        std::fs::write(&src, "digraph G {}\n").unwrap();
        let renderer = GraphvizRenderer::new("/nonexistent/dot");
        let err = renderer.render(&src, "bmp", &dir.path().join("g.bmp")).unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedFormat(f) if f == "bmp"));
    }

    #[test]
    fn spawn_failure_maps_to_renderer_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("g.gv");
        std::fs::write(&src, "digraph G {}\n").unwrap();
        let renderer = GraphvizRenderer::new(dir.path().join("no-such-dot"));
        let err = renderer.render(&src, "svg", &dir.path().join("g.svg")).unwrap_err();
        assert!(matches!(err, RenderError::Renderer(_)));
    }
}
