//! Per-function extraction records and the flattened wire format consumed
//! downstream.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::target::TargetDescriptor;

/// Extraction result for one (function, target) pair.
///
/// Each of `pre`, `body`, and `post` is either empty or newline-terminated,
/// so `pre + body + post` concatenates directly into an assemblable unit.
/// Reassembling that unit for the same target without undefined-symbol
/// errors is the defining correctness property of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFunction {
    /// Directives and declarations that must precede the function.
    pub pre: String,
    /// The function's own instructions or IR, self-contained after constant
    /// resolution.
    pub body: String,
    /// Trailing directives and data.
    pub post: String,
    pub target: TargetDescriptor,
    /// Fidelity conditions recorded during extraction (e.g. a boundary
    /// marker that was never found). Non-fatal, but never swallowed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ExtractedFunction {
    /// The standalone translation unit for round-trip assembly checks.
    pub fn assembly_unit(&self) -> String {
        format!("{}{}{}", self.pre, self.body, self.post)
    }
}

/// Where a function's dependency context comes from: synthetically generated
/// headers, or real-world source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Synth,
    Real,
}

impl Provenance {
    pub const ALL: [Provenance; 2] = [Provenance::Synth, Provenance::Real];

    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::Synth => "synth",
            Provenance::Real => "real",
        }
    }

    /// Full identifier for a (provenance, target) pair, e.g.
    /// `synth_gcc_x86_O0` or `real_clang_ir_Oz`.
    pub fn full_key(self, target_key: &str) -> String {
        format!("{}_{}", self.as_str(), target_key)
    }
}

/// Aggregate over one function across many targets.
///
/// The per-track maps distinguish three states per target key: absent
/// (never attempted), `None` (attempted and failed), and `Some` (succeeded).
/// The orchestrator exclusively owns a record while extracting; once
/// returned, callers treat it as read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Source path the function came from, when known.
    #[serde(default)]
    pub path: String,
    /// Name of the target function inside `func_def`.
    pub fname: String,
    /// Full C definition of the function, treated as an opaque blob.
    pub func_def: String,
    /// Parameter/return type names, when known.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signature: Vec<String>,
    /// Synthetic dependency preamble prepended before compilation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synth_deps: Option<String>,
    /// Real-world dependency preamble for the observed-in-the-wild track.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_deps: Option<String>,
    #[serde(default)]
    pub synth_asm: BTreeMap<String, Option<ExtractedFunction>>,
    #[serde(default)]
    pub real_asm: BTreeMap<String, Option<ExtractedFunction>>,
}

impl FunctionRecord {
    pub fn new(fname: impl Into<String>, func_def: impl Into<String>) -> Self {
        Self {
            path: String::new(),
            fname: fname.into(),
            func_def: func_def.into(),
            signature: Vec::new(),
            synth_deps: None,
            real_deps: None,
            synth_asm: BTreeMap::new(),
            real_asm: BTreeMap::new(),
        }
    }

    /// Builder-style helper to attach a source path when constructing a record.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_synth_deps(mut self, deps: impl Into<String>) -> Self {
        self.synth_deps = Some(deps.into());
        self
    }

    pub fn with_real_deps(mut self, deps: impl Into<String>) -> Self {
        self.real_deps = Some(deps.into());
        self
    }

    /// The dependency preamble for a provenance track, if present.
    pub fn deps(&self, provenance: Provenance) -> Option<&str> {
        match provenance {
            Provenance::Synth => self.synth_deps.as_deref(),
            Provenance::Real => self.real_deps.as_deref(),
        }
    }

    pub fn track(&self, provenance: Provenance) -> &BTreeMap<String, Option<ExtractedFunction>> {
        match provenance {
            Provenance::Synth => &self.synth_asm,
            Provenance::Real => &self.real_asm,
        }
    }

    pub fn track_mut(
        &mut self,
        provenance: Provenance,
    ) -> &mut BTreeMap<String, Option<ExtractedFunction>> {
        match provenance {
            Provenance::Synth => &mut self.synth_asm,
            Provenance::Real => &mut self.real_asm,
        }
    }

    /// Flatten both tracks into the parallel-sequence wire format.
    ///
    /// Entries appear synth track first, then real, each in key order, under
    /// their full `<provenance>_<target-key>` identifiers. The code column
    /// carries the extracted body, or null for an attempted-and-failed entry.
    pub fn flatten(&self) -> FlatAsm {
        let mut flat = FlatAsm::default();
        for provenance in Provenance::ALL {
            for (key, entry) in self.track(provenance) {
                flat.target.push(provenance.full_key(key));
                flat.code.push(entry.as_ref().map(|asm| asm.body.clone()));
            }
        }
        flat
    }
}

/// The persisted/transmitted shape consumed by the tokenization layer: two
/// parallel ordered sequences under fixed key names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatAsm {
    pub target: Vec<String>,
    pub code: Vec<Option<String>>,
}

impl FlatAsm {
    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}
