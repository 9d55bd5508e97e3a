//! Toolchain backends: invoking external compilers as subprocesses.
//!
//! Each backend turns a [`CompileRequest`] into the raw textual output of a
//! real compiler binary. Backends never extract anything; they only know
//! which binary to run for a descriptor, with which flags, and how to report
//! failure. All subprocess plumbing funnels through [`run_tool`].

use std::collections::HashMap;
use std::io::{Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::target::{TargetDescriptor, Toolchain};

pub mod gnu;
pub mod llvm;

pub use gnu::GnuBackend;
pub use llvm::LlvmBackend;

/// Request to compile one function's full source for a target.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    /// Complete C source: dependency preamble plus the function definition.
    pub source: String,
    /// Name of the target function inside the source.
    pub fname: String,
    pub target: TargetDescriptor,
    /// Deadline for the compiler subprocess.
    pub timeout: Duration,
}

/// Raw textual compiler output for one target, before any extraction.
#[derive(Debug, Clone)]
pub struct RawDump {
    pub text: String,
    pub target: TargetDescriptor,
}

/// Error type for backend invocation.
///
/// Every variant is fatal to its single target only; the orchestrator
/// converts them into null record entries and keeps going.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A valid descriptor names a (toolchain, architecture, bit-width)
    /// combination with no backend binary.
    #[error("no {toolchain} backend for {arch} at {bits} bits")]
    UnsupportedTarget { toolchain: &'static str, arch: &'static str, bits: u32 },

    /// The tool binary could not be started (missing, not executable, ...).
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child process failed.
    #[error("failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran but exited non-zero.
    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed { program: String, status: ExitStatus, stderr: String },

    /// The tool exceeded its deadline and was killed.
    #[error("{program} timed out after {seconds}s")]
    Timeout { program: String, seconds: u64 },
}

/// Trait implemented by toolchain backends.
pub trait ToolchainBackend: Send + Sync {
    fn compile(&self, request: &CompileRequest) -> Result<RawDump, CompileError>;
    fn name(&self) -> &'static str;
}

/// Registry for toolchain backends; callers select by name or toolchain.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Box<dyn ToolchainBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self { backends: HashMap::new() }
    }

    pub fn register<B: ToolchainBackend + 'static>(&mut self, backend: B) -> &mut Self {
        self.backends.insert(backend.name().to_string(), Box::new(backend));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn ToolchainBackend> {
        self.backends.get(name).map(|b| &**b)
    }

    /// Resolve the backend responsible for a descriptor's toolchain.
    pub fn for_toolchain(&self, toolchain: Toolchain) -> Option<&dyn ToolchainBackend> {
        let name = match toolchain {
            Toolchain::Gcc => gnu::BACKEND_NAME,
            Toolchain::Clang => llvm::BACKEND_NAME,
        };
        self.get(name)
    }

    /// Return a sorted list of registered backend names for error messages/help.
    pub fn names(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.backends.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Registry populated with both standard backends.
pub fn default_backend_registry() -> BackendRegistry {
    let mut registry = BackendRegistry::new();
    registry.register(GnuBackend);
    registry.register(LlvmBackend);
    registry
}

/// Resolve a tool binary, letting an environment variable override the
/// default name found on PATH.
pub(crate) fn resolve_tool(env_key: &str, default: &str) -> String {
    match std::env::var(env_key) {
        Ok(path) if !path.is_empty() => path,
        _ => default.to_string(),
    }
}

/// Captured output of one successful tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run an external tool with `stdin_data` piped to its stdin, enforcing a
/// deadline.
///
/// Stdout and stderr are drained on their own threads so a verbose tool
/// cannot block on a full pipe while the parent polls for exit. Stdin is fed
/// from a writer thread; the tool may legitimately exit without consuming
/// all of it, so broken-pipe write errors are ignored. On deadline expiry
/// the child is killed and the unit reports [`CompileError::Timeout`].
pub fn run_tool<I, S>(
    program: &str,
    args: I,
    stdin_data: &str,
    timeout: Duration,
) -> Result<ToolOutput, CompileError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| CompileError::Spawn { program: program.to_string(), source: e })?;

    let stdin = child.stdin.take();
    let input = stdin_data.as_bytes().to_vec();
    let writer = std::thread::spawn(move || {
        if let Some(mut pipe) = stdin {
            let _ = pipe.write_all(&input);
        }
    });

    let stdout_pipe = child.stdout.take();
    let stdout_reader = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stdout_pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    });

    let stderr_pipe = child.stderr.take();
    let stderr_reader = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stderr_pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        let polled = child
            .try_wait()
            .map_err(|e| CompileError::Wait { program: program.to_string(), source: e })?;
        match polled {
            Some(status) => break status,
            None => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = writer.join();
                    let _ = stdout_reader.join();
                    let _ = stderr_reader.join();
                    return Err(CompileError::Timeout {
                        program: program.to_string(),
                        seconds: timeout.as_secs(),
                    });
                }
                std::thread::sleep(Duration::from_millis(10));
            }
        }
    };

    let _ = writer.join();
    let stdout_bytes = stdout_reader.join().unwrap_or_default();
    let stderr_bytes = stderr_reader.join().unwrap_or_default();

    let stderr = String::from_utf8_lossy(&stderr_bytes).to_string();
    if !status.success() {
        return Err(CompileError::ToolFailed { program: program.to_string(), status, stderr });
    }

    let stdout = String::from_utf8_lossy(&stdout_bytes).to_string();
    Ok(ToolOutput { stdout, stderr })
}
