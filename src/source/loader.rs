//! Source document loader
//!
//! Reads the well-known directory of YAML source documents at startup. A
//! missing or malformed document is a warning that excludes that source,
//! never a fatal error for the process.

use super::types::{validate_source, SourceConfig};
use crate::error::{Error, Result};
use std::path::Path;
use tracing::{debug, warn};

/// Load and validate a source definition from a YAML string
pub fn load_source_str(yaml: &str) -> Result<SourceConfig> {
    let config: SourceConfig = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse source YAML: {e}")))?;
    validate_source(&config)?;
    Ok(config)
}

/// Load and validate a source definition from a file
pub fn load_source_file(path: impl AsRef<Path>) -> Result<SourceConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read source file '{}': {e}",
            path.display()
        ))
    })?;
    load_source_str(&content)
}

/// Load every source document from a directory
///
/// Documents that fail to read, parse, or validate are logged and skipped;
/// so are duplicate names. The surviving set is what the scheduler runs.
pub fn load_sources_dir(dir: impl AsRef<Path>) -> Vec<SourceConfig> {
    let dir = dir.as_ref();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "source directory unreadable, no declarative sources loaded");
            return Vec::new();
        }
    };

    let mut paths: Vec<_> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml" | "yml")
            )
        })
        .collect();
    paths.sort();

    let mut configs: Vec<SourceConfig> = Vec::new();
    for path in paths {
        match load_source_file(&path) {
            Ok(config) => {
                if configs.iter().any(|c| c.name == config.name) {
                    warn!(
                        file = %path.display(),
                        source = %config.name,
                        "duplicate source name, skipping"
                    );
                    continue;
                }
                debug!(file = %path.display(), source = %config.name, "loaded source document");
                configs.push(config);
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping malformed source document");
            }
        }
    }

    configs
}
