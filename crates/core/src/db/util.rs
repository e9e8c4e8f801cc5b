use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};

use crate::db::{GraphConfig, TraceDb};

/// Load a graph config from JSON or YAML, chosen by file extension.
///
/// `.yaml`/`.yml` are parsed as YAML; `.json` and extensionless files as JSON.
pub fn load_graph_config(path: &Path) -> Result<GraphConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph config at {}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase());
    let config = match ext.as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse YAML config {}", path.display()))?,
        Some("json") | None => serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse JSON config {}", path.display()))?,
        Some(other) => bail!("Unsupported config extension '.{}' for {}", other, path.display()),
    };
    Ok(config)
}

/// Load `path` if given, else the defaults.
pub fn load_graph_config_or_default(path: Option<&Path>) -> Result<GraphConfig> {
    match path {
        Some(p) => load_graph_config(p),
        None => Ok(GraphConfig::default()),
    }
}

/// Open a trace database read-only with a path-bearing error.
pub fn open_trace_db(path: &Path) -> Result<TraceDb> {
    TraceDb::open(path)
        .with_context(|| format!("Failed to open trace database at {}", path.display()))
}

/// Hex-encoded SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {} for hashing", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
