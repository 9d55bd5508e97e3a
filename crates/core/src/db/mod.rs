//! Corpus database integration and on-disk layout definitions.
//!
//! This module wraps a SQLite database storing:
//! - Functions registered in the corpus and their source hashes
//! - Harvest run histories with per-run unit counts
//!
//! The pieces:
//! - `CorpusConfig`: serializable corpus configuration with load/save.
//! - `CorpusLayout`: where config, DB, and per-function artifacts live on disk.
//! - `CorpusDb`: SQLite wrapper owning schema migrations and query helpers.
//! - `CorpusContext`: an opened corpus, bundled for frontends.

pub mod config;
pub mod context;
pub mod corpus_db;
pub mod layout;
pub mod models;

pub use config::CorpusConfig;
pub use context::CorpusContext;
pub use corpus_db::{CorpusDb, DbError, DbResult, CURRENT_SCHEMA_VERSION};
pub use layout::CorpusLayout;
pub use models::{FunctionRow, HarvestRunRecord, HarvestRunStatus};
