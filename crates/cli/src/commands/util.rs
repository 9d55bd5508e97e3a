use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use harvest_core::db::CorpusLayout;
use harvest_core::record::FunctionRecord;

/// Load a function record JSON from disk.
pub fn load_function_record(path: &Path) -> Result<FunctionRecord> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read function record at {}", path.display()))?;
    let record: FunctionRecord = serde_json::from_str(&body)
        .with_context(|| format!("Failed to parse function record at {}", path.display()))?;
    Ok(record)
}

/// Write `record.json` and the flattened `asm.json` for one function,
/// creating the record directory as needed. Returns both paths.
pub fn write_record_artifacts(
    layout: &CorpusLayout,
    record: &FunctionRecord,
) -> Result<(PathBuf, PathBuf)> {
    let dir = layout.record_dir(&record.fname);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create record dir {}", dir.display()))?;

    let record_path = layout.record_path(&record.fname);
    fs::write(&record_path, serde_json::to_string_pretty(record)?)
        .with_context(|| format!("Failed to write function record at {}", record_path.display()))?;

    let flat_path = layout.flat_asm_path(&record.fname);
    let flat = record.flatten();
    fs::write(&flat_path, serde_json::to_string_pretty(&flat)?).with_context(|| {
        format!("Failed to write flattened assembly at {}", flat_path.display())
    })?;

    Ok((record_path, flat_path))
}
