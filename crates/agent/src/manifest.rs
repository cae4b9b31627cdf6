//! Per-module TOML manifest (SPEC_FULL.md §REDESIGN FLAGS #4): the
//! statically-linked-registry replacement for dynamic source loading. A
//! manifest names a built-in module, whether it's enabled, an optional
//! input-schema override, and a free-form tag map threaded into the
//! module's context — the watched directory now holds these instead of
//! `.py` source files (spec §4.2).

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleManifest {
    pub module: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub schema_override: Option<serde_json::Value>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest {0}: {1}")]
    Read(String, String),
    #[error("failed to parse manifest {0}: {1}")]
    Parse(String, String),
}

impl ModuleManifest {
    pub fn parse(raw: &str, source: &str) -> Result<Self, ManifestError> {
        toml::from_str(raw).map_err(|e| ManifestError::Parse(source.to_string(), e.to_string()))
    }
}

/// Load every `*.toml` manifest directly inside `dir` (spec §4.2 step 3:
/// "load and run all modules in the directory", non-recursive).
pub async fn load_all(dir: &Path) -> Result<Vec<ModuleManifest>, ManifestError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| ManifestError::Read(dir.display().to_string(), e.to_string()))?;
    let mut manifests = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| ManifestError::Read(dir.display().to_string(), e.to_string()))? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            continue;
        }
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| ManifestError::Read(path.display().to_string(), e.to_string()))?;
        manifests.push(ModuleManifest::parse(&raw, &path.display().to_string())?);
    }
    Ok(manifests)
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
