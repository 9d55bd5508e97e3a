use std::fs;

use anyhow::{Context, Result};

use crate::{infer_corpus_name, resolve_root};

/// Initialize a new corpus at `root`.
pub fn init_corpus_command(root: &str, name: Option<String>) -> Result<()> {
    let root_path = resolve_root(root)?;
    let layout = harvest_core::db::CorpusLayout::new(&root_path);

    // Derive corpus name if not provided.
    let corpus_name = match name {
        Some(n) => n,
        None => infer_corpus_name(&root_path),
    };

    // Ensure directories exist.
    fs::create_dir_all(&layout.meta_dir)
        .with_context(|| format!("Failed to create meta dir: {}", layout.meta_dir.display()))?;
    fs::create_dir_all(&layout.functions_dir).with_context(|| {
        format!("Failed to create functions dir: {}", layout.functions_dir.display())
    })?;
    fs::create_dir_all(&layout.records_dir).with_context(|| {
        format!("Failed to create records dir: {}", layout.records_dir.display())
    })?;

    let config =
        harvest_core::db::CorpusConfig::new(&corpus_name, layout.db_path_relative_string());
    config.save(&layout.corpus_config_path)?;

    // Create the corpus database immediately so follow-on commands (and tests)
    // can rely on its presence.
    harvest_core::db::CorpusDb::open(&layout.db_path).with_context(|| {
        format!("Failed to initialize corpus database at {}", layout.db_path.display())
    })?;

    println!("Initialized harvest corpus:");
    println!("  Name: {}", corpus_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.corpus_config_path.display());
    println!("  DB path (relative): {}", config.db_path);
    println!("  Functions dir: {}", layout.functions_dir.display());
    println!("  Records dir: {}", layout.records_dir.display());

    Ok(())
}
