//! Target descriptors: validated, immutable identifiers for one compilation
//! configuration (toolchain, architecture, bit width, dialect, optimization
//! level, position independence).
//!
//! A descriptor is pure data. Everything that varies per target downstream
//! (backend binary choice, extraction strategy, comment markers) is derived
//! from it; nothing mutates it after construction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for descriptor construction and parsing.
///
/// Any field outside its enumerated domain is a construction-time error,
/// never a runtime surprise deeper in the pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidTargetError {
    #[error("unknown toolchain '{0}' (expected 'gcc' or 'clang')")]
    Toolchain(String),

    #[error("unknown architecture '{0}' (expected 'x86', 'arm', or 'riscv')")]
    Arch(String),

    #[error("unsupported bit width {0} (expected 32 or 64)")]
    BitWidth(u32),

    #[error("unknown dialect '{0}' (expected 'gas' or 'llvm')")]
    Dialect(String),

    #[error("unknown optimization level '{0}' (expected 0, 1, 2, 3, fast, g, s, or z)")]
    OptLevel(String),

    /// Cross-field rule: only clang emits textual IR in this matrix.
    #[error("the llvm dialect requires the clang toolchain")]
    IrRequiresClang,
}

/// Compiler family driven as an external subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toolchain {
    Gcc,
    Clang,
}

impl Toolchain {
    pub fn as_str(self) -> &'static str {
        match self {
            Toolchain::Gcc => "gcc",
            Toolchain::Clang => "clang",
        }
    }
}

impl FromStr for Toolchain {
    type Err = InvalidTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gcc" => Ok(Toolchain::Gcc),
            "clang" => Ok(Toolchain::Clang),
            other => Err(InvalidTargetError::Toolchain(other.to_string())),
        }
    }
}

/// Instruction-set architecture the compiler targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X86,
    Arm,
    Riscv,
}

impl Arch {
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::Arm => "arm",
            Arch::Riscv => "riscv",
        }
    }
}

impl FromStr for Arch {
    type Err = InvalidTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86" => Ok(Arch::X86),
            "arm" => Ok(Arch::Arm),
            "riscv" => Ok(Arch::Riscv),
            other => Err(InvalidTargetError::Arch(other.to_string())),
        }
    }
}

/// Pointer width of the target.
///
/// Serialized as the plain number (32 or 64) so stored records read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BitWidth {
    B32,
    B64,
}

impl BitWidth {
    pub fn as_u32(self) -> u32 {
        match self {
            BitWidth::B32 => 32,
            BitWidth::B64 => 64,
        }
    }
}

impl TryFrom<u32> for BitWidth {
    type Error = InvalidTargetError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            32 => Ok(BitWidth::B32),
            64 => Ok(BitWidth::B64),
            other => Err(InvalidTargetError::BitWidth(other)),
        }
    }
}

impl From<BitWidth> for u32 {
    fn from(value: BitWidth) -> Self {
        value.as_u32()
    }
}

/// Textual output family the compiler is asked for.
///
/// `Gas` is GNU-assembler text (x86/ARM/RISC-V); `Llvm` is LLVM textual IR.
/// The two require entirely different extraction logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Gas,
    Llvm,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Gas => "gas",
            Dialect::Llvm => "llvm",
        }
    }
}

impl FromStr for Dialect {
    type Err = InvalidTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gas" => Ok(Dialect::Gas),
            "llvm" => Ok(Dialect::Llvm),
            other => Err(InvalidTargetError::Dialect(other.to_string())),
        }
    }
}

/// Optimization level handed to the compiler as `-O<level>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptLevel {
    #[serde(rename = "0")]
    O0,
    #[serde(rename = "1")]
    O1,
    #[serde(rename = "2")]
    O2,
    #[serde(rename = "3")]
    O3,
    #[serde(rename = "fast")]
    Ofast,
    #[serde(rename = "g")]
    Og,
    #[serde(rename = "s")]
    Os,
    #[serde(rename = "z")]
    Oz,
}

impl OptLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            OptLevel::O0 => "0",
            OptLevel::O1 => "1",
            OptLevel::O2 => "2",
            OptLevel::O3 => "3",
            OptLevel::Ofast => "fast",
            OptLevel::Og => "g",
            OptLevel::Os => "s",
            OptLevel::Oz => "z",
        }
    }

    /// The flag spelling passed to the compiler, e.g. `-O0` or `-Oz`.
    pub fn flag(self) -> String {
        format!("-O{}", self.as_str())
    }
}

impl FromStr for OptLevel {
    type Err = InvalidTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(OptLevel::O0),
            "1" => Ok(OptLevel::O1),
            "2" => Ok(OptLevel::O2),
            "3" => Ok(OptLevel::O3),
            "fast" => Ok(OptLevel::Ofast),
            "g" => Ok(OptLevel::Og),
            "s" => Ok(OptLevel::Os),
            "z" => Ok(OptLevel::Oz),
            other => Err(InvalidTargetError::OptLevel(other.to_string())),
        }
    }
}

/// One point in the (toolchain x architecture x bit width x dialect x
/// optimization x position-independence) configuration matrix.
///
/// Construction validates cross-field rules; a constructed descriptor is
/// never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDescriptor {
    pub toolchain: Toolchain,
    pub arch: Arch,
    pub bits: BitWidth,
    pub dialect: Dialect,
    pub opt: OptLevel,
    pub pic: bool,
}

impl TargetDescriptor {
    pub fn new(
        toolchain: Toolchain,
        arch: Arch,
        bits: BitWidth,
        dialect: Dialect,
        opt: OptLevel,
        pic: bool,
    ) -> Result<Self, InvalidTargetError> {
        if dialect == Dialect::Llvm && toolchain != Toolchain::Clang {
            return Err(InvalidTargetError::IrRequiresClang);
        }
        Ok(Self { toolchain, arch, bits, dialect, opt, pic })
    }

    /// The architecture component of the canonical key: `ir` for the IR
    /// dialect, otherwise the arch name with a `32` suffix for 32-bit
    /// targets (`x86`, `arm`, `arm32`, `riscv`, ...).
    pub fn arch_key(&self) -> String {
        if self.dialect == Dialect::Llvm {
            return "ir".to_string();
        }
        match self.bits {
            BitWidth::B64 => self.arch.as_str().to_string(),
            BitWidth::B32 => format!("{}32", self.arch.as_str()),
        }
    }

    /// Canonical matrix key for this descriptor, e.g. `gcc_x86_O0`,
    /// `clang_ir_Oz`, or `gcc_arm32_O3_fPIC`.
    ///
    /// These strings are the external key vocabulary: downstream consumers
    /// look extraction results up by exactly these names.
    pub fn key(&self) -> String {
        let mut key =
            format!("{}_{}_O{}", self.toolchain.as_str(), self.arch_key(), self.opt.as_str());
        if self.pic {
            key.push_str("_fPIC");
        }
        key
    }

    /// The same descriptor with position independence enabled.
    pub fn with_pic(self) -> Self {
        Self { pic: true, ..self }
    }
}

impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
