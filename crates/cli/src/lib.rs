use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

pub mod commands;

/// Resolve a user-supplied `--root` argument to an absolute path.
///
/// Existing paths canonicalize; a path that does not exist yet (init creates
/// its root on demand) is joined onto the current directory instead.
pub fn resolve_root(root: &str) -> Result<PathBuf> {
    let path = Path::new(root);
    match path.canonicalize() {
        Ok(resolved) => Ok(resolved),
        Err(_) => {
            let cwd = env::current_dir().context("Failed to get current directory")?;
            Ok(cwd.join(path))
        }
    }
}

/// Infer a corpus name from the root path.
///
/// If the root has no final component (e.g., `/`), fallback to `unnamed-corpus`.
pub fn infer_corpus_name(root: &Path) -> String {
    root.file_name().and_then(|os_str| os_str.to_str()).unwrap_or("unnamed-corpus").to_string()
}

/// Compute the SHA-256 hash of a byte slice and return it as a hex string.
///
/// Function spec files are small enough to hash in one pass after they have
/// already been read for parsing.
pub fn sha256_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
