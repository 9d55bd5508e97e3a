//! GNU toolchain backend: gcc and its cross-compilation siblings.
//!
//! One backend covers every gcc target; the descriptor's (architecture,
//! bit-width) pair picks the concrete cross-compiler binary. Binary names
//! can be overridden per pair through `HARVEST_GCC_*` environment variables,
//! which is also how tests substitute fake compilers.

use super::{resolve_tool, CompileError, CompileRequest, RawDump, ToolchainBackend};
use crate::target::{Arch, BitWidth, TargetDescriptor};

pub const BACKEND_NAME: &str = "gnu";

pub struct GnuBackend;

impl ToolchainBackend for GnuBackend {
    fn compile(&self, request: &CompileRequest) -> Result<RawDump, CompileError> {
        let target = request.target;
        let program = resolve_gnu_binary(&target)?;

        let mut args: Vec<String> = vec!["-S".to_string()];
        if target.pic {
            args.push("-fPIC".to_string());
        }
        args.push(target.opt.flag());
        for fixed in ["-x", "c", "-o", "/dev/stdout", "-"] {
            args.push(fixed.to_string());
        }

        let output = super::run_tool(&program, &args, &request.source, request.timeout)?;
        Ok(RawDump { text: output.stdout, target })
    }

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }
}

/// Map (architecture, bit-width) to a gcc binary, honoring env overrides.
///
/// 32-bit is only wired up for ARM; x86 and RISC-V dumps are harvested at
/// 64 bits only.
fn resolve_gnu_binary(target: &TargetDescriptor) -> Result<String, CompileError> {
    let (env_key, default) = match (target.arch, target.bits) {
        (Arch::X86, BitWidth::B64) => ("HARVEST_GCC_X86_64", "gcc"),
        (Arch::Arm, BitWidth::B64) => ("HARVEST_GCC_AARCH64", "aarch64-linux-gnu-gcc"),
        (Arch::Arm, BitWidth::B32) => ("HARVEST_GCC_ARM32", "arm-linux-gnueabi-gcc"),
        (Arch::Riscv, BitWidth::B64) => ("HARVEST_GCC_RISCV64", "riscv64-linux-gnu-gcc"),
        (arch, bits) => {
            return Err(CompileError::UnsupportedTarget {
                toolchain: "gcc",
                arch: arch.as_str(),
                bits: bits.as_u32(),
            })
        }
    };
    Ok(resolve_tool(env_key, default))
}
