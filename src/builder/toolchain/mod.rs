//! C++ toolchain probing.
//!
//! This module decides which C++ compiler on the host can build the
//! extension, and what it supports. Each candidate compiler is a
//! [`ProbeStrategy`]; flag dialects live behind [`CompilerDriver`]
//! (GCC-style in `gcc`, MSVC-style in `msvc`).
//!
//! Probe order:
//! 1. `[toolchain] cxx` from config
//! 2. The `CXX` environment variable
//! 3. The built-in candidate list (GNU, Clang, MSVC, Intel, system `cc`/`c++`)

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::PlatformProfile;
use crate::util::process::{Executor, ProcessBuilder};

pub mod capability;
mod detect;
mod gcc;
mod msvc;
pub mod version;

pub use capability::{CapabilityCheck, CapabilityTestResult, CapabilityTester};
pub use detect::ToolchainProbe;
pub use gcc::GccDriver;
pub use msvc::MsvcDriver;

/// Compiler family, which decides flag dialect and which checks apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerFamily {
    Gcc,
    Clang,
    Msvc,
    Intel,
    Generic,
}

impl CompilerFamily {
    /// Guess the family from a command name or path.
    pub fn infer(command: &str) -> Self {
        let name = Path::new(command)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(command)
            .to_lowercase();
        let name = name.strip_suffix(".exe").unwrap_or(&name);

        if name == "cl" || name == "clang-cl" {
            CompilerFamily::Msvc
        } else if name.contains("clang") {
            CompilerFamily::Clang
        } else if name.contains("g++") || name.contains("gcc") {
            CompilerFamily::Gcc
        } else if name.starts_with("icp") || name.starts_with("icc") || name.starts_with("icx") {
            CompilerFamily::Intel
        } else {
            CompilerFamily::Generic
        }
    }

    /// GCC and Clang get the PIC and threading checks.
    pub fn is_gnu_like(&self) -> bool {
        matches!(self, CompilerFamily::Gcc | CompilerFamily::Clang)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompilerFamily::Gcc => "gcc",
            CompilerFamily::Clang => "clang",
            CompilerFamily::Msvc => "msvc",
            CompilerFamily::Intel => "intel",
            CompilerFamily::Generic => "generic",
        }
    }
}

impl fmt::Display for CompilerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of probing the host for a C++ compiler.
///
/// Built once per probe and not modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainInfo {
    pub found: bool,
    /// Human-readable compiler name
    pub name: String,
    /// First line of the compiler's version banner
    pub version: String,
    /// Command as probed (`g++`, `cl`, ...)
    pub command: String,
    /// Resolved location on `PATH`
    pub path: Option<PathBuf>,
    pub family: CompilerFamily,
    /// Whether the C++11 program compiled and ran
    pub baseline_support: bool,
    pub warnings: Vec<String>,
    /// Failures that make the compiler unusable
    pub critical_failures: Vec<String>,
}

impl ToolchainInfo {
    /// The result when no candidate exists on `PATH`.
    pub fn not_found() -> Self {
        ToolchainInfo {
            found: false,
            name: String::new(),
            version: String::new(),
            command: String::new(),
            path: None,
            family: CompilerFamily::Generic,
            baseline_support: false,
            warnings: Vec::new(),
            critical_failures: Vec::new(),
        }
    }

    /// Found, baseline dialect works, and nothing critical failed.
    pub fn is_fully_capable(&self) -> bool {
        self.found && self.baseline_support && self.critical_failures.is_empty()
    }

    /// Found and nothing critical failed; the pipeline accepts this.
    pub fn is_usable(&self) -> bool {
        self.found && self.critical_failures.is_empty()
    }

    /// A driver for the probed compiler, if one was found.
    pub fn driver(&self) -> Option<Box<dyn CompilerDriver>> {
        self.found.then(|| driver_for(&self.command, self.family))
    }
}

/// Options for building a small test executable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgramOptions {
    /// Request the C++11 dialect (or the closest the compiler offers)
    pub cxx11: bool,
    /// Link the platform thread library
    pub threads: bool,
}

/// Inputs for linking the final shared extension module.
#[derive(Debug, Clone, Default)]
pub struct ModuleInput {
    pub sources: Vec<PathBuf>,
    /// Static libraries and object files linked in after the sources
    pub objects: Vec<PathBuf>,
    pub include_dirs: Vec<PathBuf>,
    pub extra_args: Vec<String>,
    pub output: PathBuf,
}

/// Flag dialect of a compiler family.
pub trait CompilerDriver {
    /// The command this driver invokes.
    fn command(&self) -> &str;

    /// Family of the compiler.
    fn family(&self) -> CompilerFamily;

    /// Command that prints the compiler's version banner.
    fn version_command(&self) -> ProcessBuilder;

    /// Compile and link `source` into the executable `output`.
    fn executable_command(&self, source: &Path, output: &Path, opts: ProgramOptions)
        -> ProcessBuilder;

    /// Command checking that position-independent code is accepted, if the
    /// family has such a flag.
    fn pic_probe_command(&self) -> Option<ProcessBuilder>;

    /// Compile and link a shared extension module.
    fn shared_module_command(&self, input: &ModuleInput) -> ProcessBuilder;
}

/// Create the driver matching `family`.
pub fn driver_for(command: &str, family: CompilerFamily) -> Box<dyn CompilerDriver> {
    match family {
        CompilerFamily::Msvc => Box::new(MsvcDriver::new(command)),
        _ => Box::new(GccDriver::new(command, family)),
    }
}

/// One way of finding a usable compiler.
///
/// Strategies are tried in priority order by [`ToolchainProbe`].
pub trait ProbeStrategy {
    /// Command this strategy looks for.
    fn command(&self) -> &str;

    /// Probe the host. Returns [`ToolchainInfo::not_found`] when the command
    /// is not on `PATH`.
    fn probe(&self, exec: &dyn Executor, platform: PlatformProfile) -> ToolchainInfo;
}

/// A named compiler command of a known family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerCandidate {
    pub command: String,
    pub name: String,
    pub family: CompilerFamily,
}

impl CompilerCandidate {
    pub fn new(command: impl Into<String>, name: impl Into<String>, family: CompilerFamily) -> Self {
        CompilerCandidate {
            command: command.into(),
            name: name.into(),
            family,
        }
    }

    /// A user-supplied command whose family is inferred from its name.
    pub fn custom(command: impl Into<String>) -> Self {
        let command = command.into();
        let family = CompilerFamily::infer(&command);
        CompilerCandidate {
            name: format!("{} (configured)", command),
            command,
            family,
        }
    }
}

impl ProbeStrategy for CompilerCandidate {
    fn command(&self) -> &str {
        &self.command
    }

    fn probe(&self, exec: &dyn Executor, platform: PlatformProfile) -> ToolchainInfo {
        let Some(path) = exec.find_executable(&self.command) else {
            return ToolchainInfo::not_found();
        };

        tracing::debug!("probing {} at {}", self.command, path.display());

        let driver = driver_for(&self.command, self.family);
        let version = version::query_version(exec, driver.as_ref());
        let result = CapabilityTester::new(exec, platform).test(driver.as_ref(), &version.raw);

        ToolchainInfo {
            found: true,
            name: self.name.clone(),
            version: version.line,
            command: self.command.clone(),
            path: Some(path),
            family: self.family,
            baseline_support: result.baseline_support,
            warnings: result.warnings,
            critical_failures: result.critical_failures,
        }
    }
}

/// The built-in candidate list, in priority order.
pub fn default_candidates() -> Vec<CompilerCandidate> {
    use CompilerFamily::*;

    vec![
        CompilerCandidate::new("g++", "GNU G++", Gcc),
        CompilerCandidate::new("gcc", "GNU GCC", Gcc),
        CompilerCandidate::new("clang++", "Clang++", Clang),
        CompilerCandidate::new("clang", "Clang", Clang),
        CompilerCandidate::new("cl", "Microsoft Visual C++", Msvc),
        CompilerCandidate::new("cl.exe", "Microsoft Visual C++", Msvc),
        CompilerCandidate::new("icpc", "Intel C++ Compiler", Intel),
        CompilerCandidate::new("icc", "Intel C Compiler", Intel),
        CompilerCandidate::new("cc", "System C Compiler", Generic),
        CompilerCandidate::new("c++", "System C++ Compiler", Generic),
    ]
}
