//! Textual IR filtering and canonicalization.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ATTR_GROUP_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\S+").unwrap());
static METADATA_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r",?\s*![a-zA-Z0-9]+").unwrap());
static STRUCT_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"%struct\.[a-zA-Z0-9_]+").unwrap());

/// Reduce a sliced IR module to the function definition itself.
///
/// Drops comment lines, module-level headers (`source_filename`,
/// `target datalayout`, `target triple`), attribute groups and metadata
/// definitions, then scrubs attribute-group and metadata references from
/// what remains.
pub fn filter_ir(module: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for line in module.lines() {
        if line.is_empty()
            || line.starts_with(';')
            || line.starts_with("source_filename")
            || line.starts_with("target datalayout")
            || line.starts_with("target triple")
            || line.starts_with("attributes")
            || line.starts_with('!')
        {
            continue;
        }
        kept.push(line);
    }

    let joined = kept.join("\n");
    let no_attrs = ATTR_GROUP_REF.replace_all(&joined, "");
    let mut filtered = METADATA_REF.replace_all(&no_attrs, "").to_string();
    if !filtered.is_empty() && !filtered.ends_with('\n') {
        filtered.push('\n');
    }
    filtered
}

/// Rewrite compiler-assigned struct type names to stable first-appearance
/// names: the first distinct `%struct.<name>` becomes `%struct.struct0`,
/// the next `%struct.struct1`, and so on. Every occurrence of the same
/// original name maps to the same canonical name.
///
/// The transform touches nothing but the matched names, so applying it to
/// already-canonical text reproduces that text byte for byte.
pub fn canonicalize_structs(ir: &str) -> String {
    let mut assigned: HashMap<String, String> = HashMap::new();
    let mut counter = 0usize;
    STRUCT_NAME
        .replace_all(ir, |caps: &Captures<'_>| {
            let original = &caps[0];
            match assigned.get(original) {
                Some(canonical) => canonical.clone(),
                None => {
                    let canonical = format!("%struct.struct{counter}");
                    counter += 1;
                    assigned.insert(original.to_string(), canonical.clone());
                    canonical
                }
            }
        })
        .to_string()
}
