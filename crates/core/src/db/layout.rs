use std::path::{Path, PathBuf};

/// Logical layout of a corpus on disk.
///
/// This is derived from a chosen root path. It does *not* perform any IO
/// itself. The CLI or other frontends are responsible for actually creating
/// directories and files based on this layout.
#[derive(Debug, Clone)]
pub struct CorpusLayout {
    /// Root directory of the corpus.
    pub root: PathBuf,
    /// Directory for internal metadata (.harvest).
    pub meta_dir: PathBuf,
    /// Path to the corpus config file (JSON).
    pub corpus_config_path: PathBuf,
    /// Path to the corpus database file.
    pub db_path: PathBuf,
    /// Directory for function spec inputs (functions).
    pub functions_dir: PathBuf,
    /// Directory for per-function extraction outputs (records).
    pub records_dir: PathBuf,
}

impl CorpusLayout {
    /// Compute the default layout for a corpus rooted at `root`.
    ///
    /// This does *not* touch the filesystem.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let meta_dir = root.join(".harvest");
        let corpus_config_path = meta_dir.join("corpus.json");
        let db_path = meta_dir.join("corpus.db");
        let functions_dir = root.join("functions");
        let records_dir = root.join("records");

        Self { root, meta_dir, corpus_config_path, db_path, functions_dir, records_dir }
    }

    /// Compute a database path string suitable for storing in `CorpusConfig`,
    /// typically as a path relative to `root`.
    pub fn db_path_relative_string(&self) -> String {
        match self.db_path.strip_prefix(&self.root) {
            Ok(rel) => rel.to_string_lossy().to_string(),
            Err(_) => self.db_path.to_string_lossy().to_string(),
        }
    }

    /// Output directory for one function's artifacts.
    pub fn record_dir(&self, fname: &str) -> PathBuf {
        self.records_dir.join(fname)
    }

    /// Path of the full record JSON for one function.
    pub fn record_path(&self, fname: &str) -> PathBuf {
        self.record_dir(fname).join("record.json")
    }

    /// Path of the flattened assembly JSON for one function.
    pub fn flat_asm_path(&self, fname: &str) -> PathBuf {
        self.record_dir(fname).join("asm.json")
    }
}
