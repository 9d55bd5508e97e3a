//! Constant-pool symbol resolution.
//!
//! Optimized code references literals through local pool labels whose
//! definitions sit outside the sliced body. To keep a body self-contained,
//! every pool symbol it mentions is looked up in the full dump and its first
//! defining line is appended to the body. Symbols with no definition in the
//! dump are silently left unresolved.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extract::AsmProfile;
use crate::target::{Arch, BitWidth, TargetDescriptor, Toolchain};

static GNU_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.LC[0-9]*").unwrap());
static GNU_ANON: Lazy<Regex> = Lazy::new(|| Regex::new(r"a\.[0-9]*").unwrap());
static LLVM_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.LC[0-9A-Z_]*").unwrap());
static LLVM_ANON: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.L\.[a-z0-9]*").unwrap());

/// Append defining lines for constant-pool symbols referenced by `body` but
/// defined elsewhere in `dump`.
///
/// 32-bit ARM addresses literal pools PC-relatively with inline veneers, so
/// the textual lookup does not apply there and the body passes through
/// unchanged.
pub fn resolve_constants(body: String, dump: &str, target: &TargetDescriptor) -> String {
    if target.arch == Arch::Arm && target.bits == BitWidth::B32 {
        return body;
    }
    match target.toolchain {
        Toolchain::Gcc => resolve_gnu(body, dump),
        Toolchain::Clang => {
            let marker = AsmProfile::for_target(target).comment_marker;
            resolve_llvm(body, dump, marker)
        }
    }
}

/// gcc pools: `.LC<n>` literal labels plus `a.<n>` anonymous objects.
/// Each resolved symbol appends a single `sym: data` line.
fn resolve_gnu(body: String, dump: &str) -> String {
    let mut additions = Vec::new();
    for symbol in collect_symbols(&body, &[&GNU_LITERAL, &GNU_ANON]) {
        if let Some(data) = first_definition(dump, &symbol) {
            additions.push(format!("{symbol}: {data}"));
        }
    }
    append_lines(body, additions)
}

/// clang pools: `.LC*` upper-case forms plus `.L.<name>` string labels.
/// Each resolved symbol appends the label line and its comment-stripped
/// defining line.
fn resolve_llvm(body: String, dump: &str, marker: &str) -> String {
    let mut additions = Vec::new();
    for symbol in collect_symbols(&body, &[&LLVM_LITERAL, &LLVM_ANON]) {
        if let Some(data) = first_definition(dump, &symbol) {
            additions.push(format!("{symbol}:"));
            additions.push(strip_line_comment(&data, marker));
        }
    }
    append_lines(body, additions)
}

/// Distinct pool symbols mentioned in the body, in sorted order so output
/// is deterministic run to run.
fn collect_symbols(body: &str, patterns: &[&Regex]) -> BTreeSet<String> {
    let mut symbols = BTreeSet::new();
    for re in patterns {
        for m in re.find_iter(body) {
            symbols.insert(m.as_str().to_string());
        }
    }
    symbols
}

/// First line following `symbol:` in the dump. Later redefinitions are
/// ignored.
fn first_definition(dump: &str, symbol: &str) -> Option<String> {
    let pattern = format!(r"{}:[\r\n]+([^\r\n]+)", regex::escape(symbol));
    let re = Regex::new(&pattern).ok()?;
    re.captures(dump).map(|caps| caps[1].to_string())
}

fn strip_line_comment(line: &str, marker: &str) -> String {
    match line.find(marker) {
        Some(idx) => line[..idx].to_string(),
        None => line.to_string(),
    }
}

fn append_lines(mut body: String, additions: Vec<String>) -> String {
    if additions.is_empty() {
        return body;
    }
    if !body.is_empty() && !body.ends_with('\n') {
        body.push('\n');
    }
    for line in additions {
        body.push_str(&line);
        body.push('\n');
    }
    body
}
