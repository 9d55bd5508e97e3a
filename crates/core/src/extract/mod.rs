//! Extraction of one function from a full compiler dump.
//!
//! Native assembly dumps are line-scanned against boundary markers that vary
//! by toolchain and architecture; the variation lives in [`AsmProfile`] so
//! the scanner itself stays a single shared routine. IR dumps and
//! position-independent dumps take different routes entirely, selected by
//! [`strategy_for`].

use crate::target::{Arch, Dialect, TargetDescriptor, Toolchain};

pub mod constants;
pub mod ir;

/// How a given target's raw output turns into record segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Line-scan a GNU assembler dump with the given profile.
    NativeAsm(AsmProfile),
    /// Slice the function out of the IR module with an external tool, then
    /// filter and canonicalize the text.
    IrText,
    /// Return the raw dump as the body, untouched. Position-independent
    /// output routes constants through indirection tables the textual scan
    /// cannot follow, so the whole dump is kept instead of a broken slice.
    Verbatim,
}

/// Pure mapping from descriptor to extraction strategy.
pub fn strategy_for(target: &TargetDescriptor) -> ExtractionStrategy {
    if target.pic {
        ExtractionStrategy::Verbatim
    } else if target.dialect == Dialect::Llvm {
        ExtractionStrategy::IrText
    } else {
        ExtractionStrategy::NativeAsm(AsmProfile::for_target(target))
    }
}

/// Scanner parameters that vary by (toolchain, architecture).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsmProfile {
    /// Line-comment marker used by this assembler flavor.
    pub comment_marker: &'static str,
    /// ARM assemblers spell the visibility and type directives differently.
    pub arm_directives: bool,
    /// RISC-V dumps may omit call-frame markers entirely; the scanner then
    /// falls back to a return instruction as the closing marker.
    pub riscv_ret_fallback: bool,
    /// clang places its `.Lfunc_end<N>:` trailer before the call-frame
    /// epilogue marker, so the scanned block needs post-hoc repair.
    pub needs_epilogue_repair: bool,
}

impl AsmProfile {
    pub fn for_target(target: &TargetDescriptor) -> Self {
        let arm = target.arch == Arch::Arm;
        let comment_marker = match (target.toolchain, arm) {
            (Toolchain::Gcc, true) => "@",
            (Toolchain::Clang, true) => "//",
            (_, false) => "#",
        };
        Self {
            comment_marker,
            arm_directives: arm,
            riscv_ret_fallback: target.arch == Arch::Riscv,
            needs_epilogue_repair: target.toolchain == Toolchain::Clang,
        }
    }
}

/// Scanned segments of a dump, before constant-pool resolution.
///
/// `pre`, `body` and `post` are each either empty or newline-terminated, so
/// their direct concatenation reconstitutes a well-formed translation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsmSegments {
    pub pre: String,
    pub body: String,
    pub post: String,
    pub warnings: Vec<String>,
}

/// Scan a GNU assembler dump and slice out the function named `fname`.
///
/// The body is seeded with synthetic visibility and type directives so the
/// slice assembles standalone, then grows line by line from the label
/// `fname:` until the call-frame epilogue marker (inclusive). Everything
/// before the label lands in `pre` (minus any line that restates the seeded
/// visibility directive), everything after the close lands in `post`.
/// Comments are stripped from the body only.
///
/// If a boundary marker never shows up the scan still returns what it has,
/// with a note in `warnings`.
pub fn extract_gas_function(dump: &str, fname: &str, profile: &AsmProfile) -> AsmSegments {
    let (global_line, type_line) = if profile.arm_directives {
        (format!(".global {fname}"), format!(".type {fname}, %function"))
    } else {
        (format!(".globl {fname}"), format!(".type {fname}, @function"))
    };

    let mut func: Vec<String> = vec![global_line, type_line];
    let mut pre: Vec<String> = Vec::new();
    let mut post: Vec<String> = Vec::new();

    let open_marker = format!("{fname}:");
    let dump_has_cfi = dump.contains(".cfi_endproc");
    let mut inside = false;
    let mut after = false;
    let mut opened = false;

    for line in dump.lines() {
        if line.starts_with(&open_marker) {
            inside = true;
            opened = true;
        }

        if inside {
            func.push(line.to_string());
        } else if after {
            post.push(line.to_string());
        } else if !restates_visibility(line, fname) {
            pre.push(line.to_string());
        }

        if inside && line.contains(".cfi_endproc") {
            inside = false;
            after = true;
        } else if inside && profile.riscv_ret_fallback && !dump_has_cfi && is_return_line(line) {
            // Stripped RISC-V dumps carry no call-frame directives at all;
            // the first return instruction closes the region instead.
            inside = false;
            after = true;
        }
    }

    let mut warnings = Vec::new();
    if !opened {
        log::warn!("opening marker '{open_marker}' not found in dump");
        warnings.push(format!("opening marker '{open_marker}' not found; body holds only synthetic directives"));
    } else if inside {
        log::warn!("no closing marker after '{open_marker}'; body runs to end of dump");
        warnings.push(format!("no closing marker after '{open_marker}'; body runs to end of dump"));
    }

    let mut func = strip_comments(&func, profile.comment_marker);
    if profile.needs_epilogue_repair {
        func = repair_clang_epilogue(func, &mut post);
    }

    AsmSegments {
        pre: join_lines(&pre),
        body: join_lines(&func),
        post: join_lines(&post),
        warnings,
    }
}

/// Drop everything from the first comment marker onward; discard lines left
/// with no tokens at all.
fn strip_comments(lines: &[String], marker: &str) -> Vec<String> {
    let mut kept = Vec::new();
    for line in lines {
        let code = match line.find(marker) {
            Some(idx) => &line[..idx],
            None => line.as_str(),
        };
        if !code.trim().is_empty() {
            kept.push(code.to_string());
        }
    }
    kept
}

/// True for pre-context lines that restate the visibility directive the body
/// already carries synthetically.
fn restates_visibility(line: &str, fname: &str) -> bool {
    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(directive), Some(symbol)) => {
            (directive == ".globl" || directive == ".global") && symbol == fname
        }
        _ => false,
    }
}

/// Return-instruction check for the RISC-V fallback: `ret`, or `jr ra`.
fn is_return_line(line: &str) -> bool {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
        Some("ret") => true,
        Some("jr") => tokens.next() == Some("ra"),
        _ => false,
    }
}

fn is_func_end_label(line: &str) -> bool {
    line.strip_prefix(".Lfunc_end")
        .and_then(|rest| rest.strip_suffix(':'))
        .map(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// clang closes a function with `.Lfunc_end<N>:` and a `.size` directive
/// before the call-frame epilogue marker, so the plain scan leaves them
/// inside the body. Cut the body at the trailer label, hand the trailer and
/// everything after it to the post context, and keep the epilogue marker in
/// the body where it belongs.
fn repair_clang_epilogue(func: Vec<String>, post: &mut Vec<String>) -> Vec<String> {
    let Some(idx) = func.iter().position(|l| is_func_end_label(l)) else {
        return func;
    };

    let mut body: Vec<String> = func[..idx].to_vec();
    let mut tail: Vec<String> = func[idx..].to_vec();

    let tail_has_cfi = tail.iter().any(|l| l.contains(".cfi_endproc"));
    let body_has_cfi = body.iter().any(|l| l.contains(".cfi_endproc"));
    if tail_has_cfi && !body_has_cfi {
        body.push("\t.cfi_endproc".to_string());
        tail.retain(|l| !l.contains(".cfi_endproc"));
    }

    let mut new_post = tail;
    new_post.append(post);
    *post = new_post;
    body
}

fn join_lines(lines: &[String]) -> String {
    if lines.is_empty() {
        String::new()
    } else {
        let mut joined = lines.join("\n");
        joined.push('\n');
        joined
    }
}
