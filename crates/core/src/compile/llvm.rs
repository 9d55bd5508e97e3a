//! LLVM toolchain backend: clang for native assembly and textual IR.
//!
//! clang is a native cross-compiler, so a single binary serves every
//! architecture via `--target=` triples. The same backend also emits LLVM IR
//! when the descriptor's dialect asks for it; slicing one function out of the
//! emitted module is done afterwards with `llvm-extract` (see
//! [`slice_ir_function`]).

use std::time::Duration;

use super::{resolve_tool, CompileError, CompileRequest, RawDump, ToolchainBackend};
use crate::target::{Arch, BitWidth, Dialect};

pub const BACKEND_NAME: &str = "llvm";

pub struct LlvmBackend;

impl ToolchainBackend for LlvmBackend {
    fn compile(&self, request: &CompileRequest) -> Result<RawDump, CompileError> {
        let target = request.target;
        let program = resolve_tool("HARVEST_CLANG", "clang");

        let mut args: Vec<String> = Vec::new();
        match (target.arch, target.bits) {
            (Arch::X86, BitWidth::B64) => {}
            (Arch::Arm, BitWidth::B64) => args.push("--target=aarch64".to_string()),
            (Arch::Arm, BitWidth::B32) => args.push("--target=arm-linux-gnueabi".to_string()),
            (Arch::Riscv, BitWidth::B64) => args.push("--target=riscv64".to_string()),
            (arch, bits) => {
                return Err(CompileError::UnsupportedTarget {
                    toolchain: "clang",
                    arch: arch.as_str(),
                    bits: bits.as_u32(),
                })
            }
        }
        if target.pic {
            args.push("-fPIC".to_string());
        }
        args.push("-S".to_string());
        if target.dialect == Dialect::Llvm {
            args.push("-emit-llvm".to_string());
        }
        args.push(target.opt.flag());
        for fixed in ["-x", "c", "-o", "/dev/stdout", "-"] {
            args.push(fixed.to_string());
        }

        // IR symbols for static functions get internal linkage and local
        // names, which breaks extraction by name. Dropping the qualifier
        // keeps the symbol visible; native asm dumps are left untouched.
        let source = if target.dialect == Dialect::Llvm {
            strip_static_qualifier(&request.source)
        } else {
            request.source.clone()
        };

        let output = super::run_tool(&program, &args, &source, request.timeout)?;
        Ok(RawDump { text: output.stdout, target })
    }

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }
}

/// Textually remove `static` qualifiers so the symbol keeps external linkage.
pub fn strip_static_qualifier(source: &str) -> String {
    source.replace("static ", " ").replace("static\n", "\n").replace("static\t", "\t")
}

/// Slice one named function definition out of a textual IR module using
/// `llvm-extract` (override the binary with `HARVEST_LLVM_EXTRACT`).
pub fn slice_ir_function(module: &str, fname: &str, timeout: Duration) -> Result<String, CompileError> {
    let program = resolve_tool("HARVEST_LLVM_EXTRACT", "llvm-extract");
    let func_flag = format!("--func={fname}");
    let output = super::run_tool(&program, ["-S", func_flag.as_str()], module, timeout)?;
    Ok(output.stdout)
}
