use std::path::Path;

use anyhow::{Context, Result};

use crate::db::{CorpusConfig, CorpusDb, CorpusLayout};

/// An opened corpus: derived paths plus a live database handle.
///
/// Frontends go through this instead of assembling the pieces themselves, so
/// a root that was never initialized fails at open time rather than midway
/// through a command.
#[derive(Debug)]
pub struct CorpusContext {
    pub layout: CorpusLayout,
    pub db: CorpusDb,
}

impl CorpusContext {
    /// Open the corpus rooted at `root`.
    ///
    /// Loading the config is the validity check; the database itself lives
    /// at the layout's fixed location.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let layout = CorpusLayout::new(root);
        let config = CorpusConfig::load(&layout.corpus_config_path)?;
        log::debug!("opened corpus '{}' at {}", config.name, layout.root.display());
        let db = CorpusDb::open(&layout.db_path).with_context(|| {
            format!("Failed to open corpus database at {}", layout.db_path.display())
        })?;
        Ok(Self { layout, db })
    }
}
