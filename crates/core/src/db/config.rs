use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// On-disk corpus configuration, stored at `.harvest/corpus.json`.
///
/// The engine always opens the database at the layout's fixed location;
/// `db_path` is recorded relative to the root so external tooling can find
/// the file without re-deriving the layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Human-friendly corpus name.
    pub name: String,
    /// Optional description / notes.
    pub description: Option<String>,
    /// Config format version. This is about the JSON layout, not the DB schema.
    pub config_version: String,
    /// Corpus database location, relative to the corpus root.
    pub db_path: String,
}

impl CorpusConfig {
    pub fn new(name: impl Into<String>, db_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            db_path: db_path.into(),
        }
    }

    /// Read and parse the config JSON at `path`.
    ///
    /// Failing here is how an uninitialized root is detected, so the error
    /// keeps the path visible.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read corpus config at {}", path.display()))?;
        serde_json::from_str(&json).context("Failed to parse corpus config JSON")
    }

    /// Write the config JSON to `path`, pretty-printed for hand inspection.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write corpus config to {}", path.display()))
    }
}
