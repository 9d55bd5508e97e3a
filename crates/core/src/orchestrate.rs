//! Extraction orchestrator: fans one function record across the target
//! matrix and merges results back in.
//!
//! Skip decisions happen single-threaded before any unit is scheduled, each
//! (provenance, target) key is scheduled at most once, and merging happens
//! single-threaded after workers finish. Workers therefore never share a
//! record entry, which is what makes a run safe to parallelize.

use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::compile::{llvm, BackendRegistry, CompileError, CompileRequest};
use crate::extract::{self, constants, ir, ExtractionStrategy};
use crate::matrix::TargetMatrix;
use crate::record::{ExtractedFunction, FunctionRecord, Provenance};
use crate::target::TargetDescriptor;

/// Options for one extraction run.
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    /// Also run the observed-in-the-wild track when the record carries
    /// real-world deps. Off by default; most functions only have the
    /// synthetic preamble.
    pub include_real: bool,
    /// Re-extract targets that already hold a successful result.
    pub replace_existing: bool,
    /// Deadline applied to each compiler subprocess.
    pub timeout: Duration,
    /// Worker threads for compile+extract units.
    pub jobs: usize,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            include_real: false,
            replace_existing: false,
            timeout: Duration::from_secs(60),
            jobs: 4,
        }
    }
}

/// How each scheduled unit of a run ended, by full identifier
/// (`<provenance>_<target-key>`). All lists are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestSummary {
    pub attempted: Vec<String>,
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
    pub started_at: String,
    pub finished_at: String,
}

/// One compile+extract work item.
struct Unit {
    provenance: Provenance,
    key: String,
    target: TargetDescriptor,
    source: String,
    fname: String,
    timeout: Duration,
}

impl Unit {
    fn full_key(&self) -> String {
        self.provenance.full_key(&self.key)
    }
}

/// Drives the matrix for one function record at a time.
pub struct Harvester<'a> {
    matrix: &'a TargetMatrix,
    registry: &'a BackendRegistry,
    options: HarvestOptions,
}

impl<'a> Harvester<'a> {
    pub fn new(matrix: &'a TargetMatrix, registry: &'a BackendRegistry, options: HarvestOptions) -> Self {
        Self { matrix, registry, options }
    }

    /// Run every due (provenance, target) unit and merge the outcomes into
    /// the record.
    ///
    /// A unit is due when its track entry is absent or `None`; entries
    /// already holding a successful extraction are skipped unless
    /// `replace_existing` is set. Each failed unit stores `None` under its
    /// key and the run continues; per-target failure never aborts the rest.
    pub fn run(&self, record: &mut FunctionRecord) -> HarvestSummary {
        let started_at = Utc::now().to_rfc3339();
        let mut attempted = Vec::new();
        let mut skipped = Vec::new();
        let mut units: Vec<Unit> = Vec::new();

        for provenance in Provenance::ALL {
            if provenance == Provenance::Real && !self.options.include_real {
                continue;
            }
            let Some(deps) = record.deps(provenance) else {
                continue;
            };
            let source = build_source(deps, &record.func_def);

            for (key, target) in self.matrix.iter() {
                let full = provenance.full_key(key);
                if !self.options.replace_existing
                    && matches!(record.track(provenance).get(key), Some(Some(_)))
                {
                    skipped.push(full);
                    continue;
                }
                attempted.push(full);
                units.push(Unit {
                    provenance,
                    key: key.clone(),
                    target: *target,
                    source: source.clone(),
                    fname: record.fname.clone(),
                    timeout: self.options.timeout,
                });
            }
        }

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        if !units.is_empty() {
            let jobs = self.options.jobs.clamp(1, units.len());
            let queue = Mutex::new(units);
            let (tx, rx) = std::sync::mpsc::channel();

            std::thread::scope(|scope| {
                for _ in 0..jobs {
                    let tx = tx.clone();
                    let queue = &queue;
                    scope.spawn(move || loop {
                        let unit = match queue.lock() {
                            Ok(mut q) => q.pop(),
                            Err(_) => None,
                        };
                        let Some(unit) = unit else { break };
                        let outcome = run_unit(self.registry, &unit);
                        if tx.send((unit.provenance, unit.key, outcome)).is_err() {
                            break;
                        }
                    });
                }
                drop(tx);

                for (provenance, key, outcome) in rx {
                    let full = provenance.full_key(&key);
                    match &outcome {
                        Some(_) => succeeded.push(full),
                        None => failed.push(full),
                    }
                    record.track_mut(provenance).insert(key, outcome);
                }
            });
        }

        attempted.sort();
        succeeded.sort();
        failed.sort();
        skipped.sort();

        HarvestSummary {
            attempted,
            succeeded,
            failed,
            skipped,
            started_at,
            finished_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Full source for one track: dependency preamble, newline, then the
/// definition. `inline` is neutralized everywhere so the function cannot be
/// folded away before it reaches the dump.
fn build_source(deps: &str, func_def: &str) -> String {
    format!("{deps}\n{func_def}").replace("inline", " ")
}

fn run_unit(registry: &BackendRegistry, unit: &Unit) -> Option<ExtractedFunction> {
    match compile_and_extract(registry, unit) {
        Ok(extracted) => Some(extracted),
        Err(err) => {
            log::warn!("{}: {err}", unit.full_key());
            None
        }
    }
}

fn compile_and_extract(registry: &BackendRegistry, unit: &Unit) -> Result<ExtractedFunction, CompileError> {
    let target = unit.target;
    let backend = registry.for_toolchain(target.toolchain).ok_or(CompileError::UnsupportedTarget {
        toolchain: target.toolchain.as_str(),
        arch: target.arch.as_str(),
        bits: target.bits.as_u32(),
    })?;

    let request = CompileRequest {
        source: unit.source.clone(),
        fname: unit.fname.clone(),
        target,
        timeout: unit.timeout,
    };
    let dump = backend.compile(&request)?;

    let extracted = match extract::strategy_for(&target) {
        ExtractionStrategy::Verbatim => ExtractedFunction {
            pre: String::new(),
            body: dump.text,
            post: String::new(),
            target,
            warnings: Vec::new(),
        },
        ExtractionStrategy::NativeAsm(profile) => {
            let segments = extract::extract_gas_function(&dump.text, &unit.fname, &profile);
            let body = constants::resolve_constants(segments.body, &dump.text, &target);
            ExtractedFunction {
                pre: segments.pre,
                body,
                post: segments.post,
                target,
                warnings: segments.warnings,
            }
        }
        ExtractionStrategy::IrText => {
            let sliced = llvm::slice_ir_function(&dump.text, &unit.fname, unit.timeout)?;
            let body = ir::canonicalize_structs(&ir::filter_ir(&sliced));
            ExtractedFunction {
                pre: String::new(),
                body,
                post: String::new(),
                target,
                warnings: Vec::new(),
            }
        }
    };
    Ok(extracted)
}
