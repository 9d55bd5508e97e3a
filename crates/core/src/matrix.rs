//! The fixed registry of named compilation configurations.
//!
//! The matrix is built once at startup by a pure factory and never mutated:
//! 21 base configurations plus a position-independent (`_fPIC`) variant of
//! each, keyed by the canonical strings downstream consumers use for lookup.

use std::collections::BTreeMap;

use crate::target::{Arch, BitWidth, Dialect, OptLevel, TargetDescriptor, Toolchain};

/// Immutable, ordered mapping from canonical key to target descriptor.
#[derive(Debug, Clone, Default)]
pub struct TargetMatrix {
    targets: BTreeMap<String, TargetDescriptor>,
}

impl TargetMatrix {
    /// Build a matrix from descriptors, keyed by each one's canonical key.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = TargetDescriptor>) -> Self {
        let mut targets = BTreeMap::new();
        for desc in descriptors {
            targets.insert(desc.key(), desc);
        }
        Self { targets }
    }

    pub fn get(&self, key: &str) -> Option<&TargetDescriptor> {
        self.targets.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.targets.contains_key(key)
    }

    /// Restrict the matrix to the requested keys.
    ///
    /// A requested key absent from the matrix yields no entry, not an error;
    /// unknown keys are a caller concern, not an extraction failure.
    pub fn filter<I, S>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut targets = BTreeMap::new();
        for key in keys {
            if let Some(desc) = self.targets.get(key.as_ref()) {
                targets.insert(key.as_ref().to_string(), *desc);
            }
        }
        Self { targets }
    }

    /// Canonical keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.targets.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TargetDescriptor)> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// The default configuration matrix.
///
/// Every base entry below also gets a `_fPIC` variant, so the full matrix
/// holds twice these entries. IR extraction runs on the x86-64 host triple
/// only; the other architectures are covered in assembler form.
pub fn default_target_matrix() -> TargetMatrix {
    let gas = |toolchain, arch, bits, opt| TargetDescriptor {
        toolchain,
        arch,
        bits,
        dialect: Dialect::Gas,
        opt,
        pic: false,
    };
    let ir = |opt| TargetDescriptor {
        toolchain: Toolchain::Clang,
        arch: Arch::X86,
        bits: BitWidth::B64,
        dialect: Dialect::Llvm,
        opt,
        pic: false,
    };

    let base = [
        gas(Toolchain::Gcc, Arch::X86, BitWidth::B64, OptLevel::O0),
        gas(Toolchain::Gcc, Arch::X86, BitWidth::B64, OptLevel::O3),
        gas(Toolchain::Gcc, Arch::X86, BitWidth::B64, OptLevel::Os),
        gas(Toolchain::Gcc, Arch::Arm, BitWidth::B64, OptLevel::O0),
        gas(Toolchain::Gcc, Arch::Arm, BitWidth::B64, OptLevel::Os),
        gas(Toolchain::Gcc, Arch::Arm, BitWidth::B64, OptLevel::O3),
        gas(Toolchain::Clang, Arch::X86, BitWidth::B64, OptLevel::O0),
        gas(Toolchain::Clang, Arch::X86, BitWidth::B64, OptLevel::O3),
        ir(OptLevel::O0),
        ir(OptLevel::Oz),
        ir(OptLevel::O3),
        gas(Toolchain::Clang, Arch::Arm, BitWidth::B64, OptLevel::O0),
        gas(Toolchain::Clang, Arch::Arm, BitWidth::B64, OptLevel::O3),
        gas(Toolchain::Gcc, Arch::Riscv, BitWidth::B64, OptLevel::O0),
        gas(Toolchain::Gcc, Arch::Riscv, BitWidth::B64, OptLevel::O3),
        gas(Toolchain::Clang, Arch::Riscv, BitWidth::B64, OptLevel::O0),
        gas(Toolchain::Clang, Arch::Riscv, BitWidth::B64, OptLevel::O3),
        gas(Toolchain::Gcc, Arch::Arm, BitWidth::B32, OptLevel::O0),
        gas(Toolchain::Gcc, Arch::Arm, BitWidth::B32, OptLevel::O3),
        gas(Toolchain::Clang, Arch::Arm, BitWidth::B32, OptLevel::O0),
        gas(Toolchain::Clang, Arch::Arm, BitWidth::B32, OptLevel::O3),
    ];

    let mut targets = BTreeMap::new();
    for desc in base {
        targets.insert(desc.key(), desc);
        let pic = desc.with_pic();
        targets.insert(pic.key(), pic);
    }
    TargetMatrix { targets }
}
