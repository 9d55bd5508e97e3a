use serde::{Deserialize, Serialize};

/// Allowed status values for harvest runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HarvestRunStatus {
    /// Every scheduled unit produced an extraction.
    Succeeded,
    /// Some units produced extractions, some failed.
    Partial,
    /// Every scheduled unit failed.
    Failed,
}

impl HarvestRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HarvestRunStatus::Succeeded => "succeeded",
            HarvestRunStatus::Partial => "partial",
            HarvestRunStatus::Failed => "failed",
        }
    }

    /// Derive a status from unit counts. A run with nothing failed counts as
    /// succeeded, including the all-skipped case.
    pub fn from_counts(succeeded: usize, failed: usize) -> Self {
        if failed == 0 {
            HarvestRunStatus::Succeeded
        } else if succeeded == 0 {
            HarvestRunStatus::Failed
        } else {
            HarvestRunStatus::Partial
        }
    }
}

/// Row describing a function registered in the corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionRow {
    /// Function name, unique within a corpus.
    pub fname: String,
    /// Source file the function came from, when known.
    pub source_path: Option<String>,
    /// SHA-256 of the function spec file the row was registered from.
    pub source_hash: String,
    /// Timestamp the function was first registered.
    pub added_at: String,
}

impl FunctionRow {
    pub fn new(fname: impl Into<String>, source_hash: impl Into<String>, added_at: impl Into<String>) -> Self {
        Self {
            fname: fname.into(),
            source_path: None,
            source_hash: source_hash.into(),
            added_at: added_at.into(),
        }
    }

    /// Builder-style helper to attach a source path when constructing a row.
    pub fn with_source_path(mut self, source_path: Option<String>) -> Self {
        self.source_path = source_path;
        self
    }
}

/// Record describing one harvest run for bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HarvestRunRecord {
    pub fname: String,
    pub source_hash: String,
    pub n_attempted: i64,
    pub n_succeeded: i64,
    pub n_failed: i64,
    pub n_skipped: i64,
    pub status: HarvestRunStatus,
    pub started_at: String,
    pub finished_at: String,
}
