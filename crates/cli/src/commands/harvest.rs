use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::commands::{load_function_record, write_record_artifacts};
use crate::{resolve_root, sha256_bytes};
use harvest_core::compile::default_backend_registry;
use harvest_core::db::{CorpusContext, FunctionRow, HarvestRunRecord, HarvestRunStatus};
use harvest_core::matrix::default_target_matrix;
use harvest_core::orchestrate::{HarvestOptions, Harvester};
use harvest_core::record::{FunctionRecord, Provenance};

/// One function to harvest, as described by a spec file on disk.
#[derive(Debug, Deserialize, Serialize)]
pub struct FunctionSpec {
    /// Name of the function defined in `func_def`.
    pub fname: String,
    /// Full C definition of the function.
    pub func_def: String,
    /// Source file the definition came from, if known.
    #[serde(default)]
    pub path: Option<String>,
    /// Parameter/return type names, if known.
    #[serde(default)]
    pub signature: Vec<String>,
    /// Synthetic dependency preamble. Missing means compile with none.
    #[serde(default)]
    pub synth_deps: Option<String>,
    /// Real-world dependency preamble for the `--real` track.
    #[serde(default)]
    pub real_deps: Option<String>,
}

impl FunctionSpec {
    pub fn validate(&self) -> Result<()> {
        if self.fname.trim().is_empty() {
            return Err(anyhow!("Function spec 'fname' is required"));
        }
        if self.func_def.trim().is_empty() {
            return Err(anyhow!("Function spec 'func_def' is required"));
        }
        Ok(())
    }
}

/// Tuning knobs for `extract_command`, mapped from CLI flags.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Comma-separated target keys to restrict the run.
    pub targets: Option<String>,
    /// Harvest the real-dependency track as well.
    pub real: bool,
    /// Re-extract targets that already hold an entry.
    pub replace: bool,
    /// Worker threads driving compilers.
    pub jobs: usize,
    /// Per-compile timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { targets: None, real: false, replace: false, jobs: 4, timeout_secs: 60 }
    }
}

/// Compile one function across the target matrix and persist the results.
pub fn extract_command(root: &str, file: &str, options: &ExtractOptions, json: bool) -> Result<()> {
    let root_path = resolve_root(root)?;
    let ctx = CorpusContext::from_root(&root_path)?;

    // Load function spec (supports YAML or JSON based on extension).
    let spec_path = Path::new(file);
    let spec_bytes = fs::read(spec_path)
        .with_context(|| format!("Failed to read function spec at {}", spec_path.display()))?;
    let spec_hash = sha256_bytes(&spec_bytes);
    let spec: FunctionSpec = if spec_path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_slice(&spec_bytes).context("Failed to parse function spec JSON")?
    } else {
        serde_yaml::from_slice(&spec_bytes).context("Failed to parse function spec YAML")?
    };
    spec.validate()?;

    // Start from the stored record when one exists so earlier extractions
    // survive a re-run; the definition and deps always come from the spec file.
    let record_path = ctx.layout.record_path(&spec.fname);
    let mut record = if record_path.exists() {
        let mut existing = load_function_record(&record_path)?;
        existing.func_def = spec.func_def.clone();
        existing.path = spec.path.clone().unwrap_or_default();
        existing.signature = spec.signature.clone();
        existing.synth_deps = Some(spec.synth_deps.clone().unwrap_or_default());
        existing.real_deps = spec.real_deps.clone();
        existing
    } else {
        let mut record = FunctionRecord::new(&spec.fname, &spec.func_def)
            .with_synth_deps(spec.synth_deps.clone().unwrap_or_default());
        if let Some(path) = &spec.path {
            record = record.with_path(path);
        }
        if let Some(deps) = &spec.real_deps {
            record = record.with_real_deps(deps);
        }
        record.signature = spec.signature.clone();
        record
    };

    // Restrict the matrix when --targets was given.
    let matrix = default_target_matrix();
    let matrix = match &options.targets {
        Some(list) => {
            let keys: Vec<&str> = list.split(',').map(str::trim).filter(|k| !k.is_empty()).collect();
            let filtered = matrix.filter(keys);
            if filtered.is_empty() {
                return Err(anyhow!(
                    "No known targets in '{list}' (run `asm-harvester targets` for the list)"
                ));
            }
            filtered
        }
        None => matrix,
    };

    let registry = default_backend_registry();
    let harvest_options = HarvestOptions {
        include_real: options.real,
        replace_existing: options.replace,
        timeout: Duration::from_secs(options.timeout_secs),
        jobs: options.jobs,
    };
    log::info!("extracting '{}' across {} targets", spec.fname, matrix.len());
    let harvester = Harvester::new(&matrix, &registry, harvest_options);
    let summary = harvester.run(&mut record);
    log::info!(
        "'{}': {} succeeded, {} failed, {} skipped",
        spec.fname,
        summary.succeeded.len(),
        summary.failed.len(),
        summary.skipped.len()
    );

    let (record_path, flat_path) = write_record_artifacts(&ctx.layout, &record)?;

    // Record the function and the run in the corpus database.
    let now = Utc::now().to_rfc3339();
    let row = FunctionRow::new(&spec.fname, &spec_hash, &now)
        .with_source_path(Some(spec_path.display().to_string()));
    ctx.db.upsert_function(&row).context("Failed to record function in corpus database")?;

    let run = HarvestRunRecord {
        fname: spec.fname.clone(),
        source_hash: spec_hash,
        n_attempted: summary.attempted.len() as i64,
        n_succeeded: summary.succeeded.len() as i64,
        n_failed: summary.failed.len() as i64,
        n_skipped: summary.skipped.len() as i64,
        status: HarvestRunStatus::from_counts(summary.succeeded.len(), summary.failed.len()),
        started_at: summary.started_at.clone(),
        finished_at: summary.finished_at.clone(),
    };
    ctx.db.insert_harvest_run(&run).context("Failed to record harvest run")?;

    if json {
        let payload = serde_json::json!({
            "fname": spec.fname,
            "status": run.status.as_str(),
            "attempted": summary.attempted,
            "succeeded": summary.succeeded,
            "failed": summary.failed,
            "skipped": summary.skipped,
            "record": record_path.display().to_string(),
            "flat_asm": flat_path.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Harvested function: {}", spec.fname);
    println!("  Status: {}", run.status.as_str());
    println!(
        "  Targets: {} attempted, {} succeeded, {} failed, {} skipped",
        run.n_attempted, run.n_succeeded, run.n_failed, run.n_skipped
    );
    if !summary.failed.is_empty() {
        println!("  Failed targets:");
        for key in &summary.failed {
            println!("    - {}", key);
        }
    }
    println!("  Record: {}", record_path.display());
    println!("  Flat asm: {}", flat_path.display());

    Ok(())
}

/// Per-track extraction state for one function, measured against the full
/// default matrix.
#[derive(Debug, Serialize)]
pub struct TrackSummary {
    pub provenance: String,
    pub ok: Vec<String>,
    pub failed: Vec<String>,
    pub missing: Vec<String>,
}

/// Show the extraction state recorded for one function.
pub fn show_command(root: &str, fname: &str, json: bool) -> Result<()> {
    let root_path = resolve_root(root)?;
    let ctx = CorpusContext::from_root(&root_path)?;

    let record_path = ctx.layout.record_path(fname);
    if !record_path.exists() {
        return Err(anyhow!("No extraction record for '{}' at {}", fname, record_path.display()));
    }
    let record = load_function_record(&record_path)?;

    let matrix = default_target_matrix();
    let mut tracks = Vec::new();
    for provenance in Provenance::ALL {
        let track = record.track(provenance);
        if track.is_empty() && record.deps(provenance).is_none() {
            continue;
        }
        let mut summary = TrackSummary {
            provenance: provenance.as_str().to_string(),
            ok: Vec::new(),
            failed: Vec::new(),
            missing: Vec::new(),
        };
        for key in matrix.keys() {
            match track.get(&key) {
                Some(Some(_)) => summary.ok.push(key),
                Some(None) => summary.failed.push(key),
                None => summary.missing.push(key),
            }
        }
        tracks.push(summary);
    }

    let function_row = ctx.db.get_function(fname).ok().flatten();

    if json {
        let payload = serde_json::json!({
            "fname": record.fname,
            "path": record.path,
            "record": record_path.display().to_string(),
            "flat_asm": ctx.layout.flat_asm_path(fname).display().to_string(),
            "function": function_row,
            "tracks": tracks,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Function: {}", record.fname);
    if !record.path.is_empty() {
        println!("  Source path: {}", record.path);
    }
    if let Some(row) = &function_row {
        println!("  Registered: {} (spec hash {})", row.added_at, row.source_hash);
    }
    println!("  Record: {}", record_path.display());
    for track in &tracks {
        println!(
            "  Track {}: {} ok, {} failed, {} missing",
            track.provenance,
            track.ok.len(),
            track.failed.len(),
            track.missing.len()
        );
        for key in &track.failed {
            println!("    failed: {}", key);
        }
    }
    // Surface extraction warnings; they mark entries that need a closer look.
    for provenance in Provenance::ALL {
        for (key, entry) in record.track(provenance) {
            if let Some(asm) = entry {
                for warning in &asm.warnings {
                    println!("  Warning [{}]: {}", provenance.full_key(key), warning);
                }
            }
        }
    }

    Ok(())
}

/// List harvest runs recorded in the corpus database.
pub fn runs_command(root: &str, fname: Option<&str>, json: bool) -> Result<()> {
    let root_path = resolve_root(root)?;
    let ctx = CorpusContext::from_root(&root_path)?;

    let runs = ctx.db.list_harvest_runs(fname).context("Failed to list harvest runs")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("Harvest runs: (none)");
        return Ok(());
    }

    println!("Harvest runs:");
    for run in runs {
        println!(
            "- {} [{}] {} attempted, {} succeeded, {} failed, {} skipped ({})",
            run.fname,
            run.status.as_str(),
            run.n_attempted,
            run.n_succeeded,
            run.n_failed,
            run.n_skipped,
            run.finished_at
        );
    }

    Ok(())
}
