//! harvest-core
//!
//! Core library for multi-target assembly extraction from compiler output.
//!
//! This crate defines the target descriptor matrix, toolchain backends that
//! drive external compilers as subprocesses, per-dialect extraction of a
//! single function from a full translation-unit dump, constant-pool
//! resolution, IR canonicalization, the extraction orchestrator, and the
//! corpus bookkeeping database.
//!
//! The goal is to keep all substantive logic here so it is fully testable and
//! reusable from multiple frontends (CLI, batch drivers, etc.).

pub mod compile;
pub mod db;
pub mod extract;
pub mod matrix;
pub mod orchestrate;
pub mod record;
pub mod target;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
