//! Build prerequisite checks.
//!
//! Confirms that every external tool the pipeline needs is present before
//! anything is built:
//!
//! - the native build tool (`cargo`), always
//! - the binding generator (`swig`), only when packaging
//! - a C++ compiler that passes the capability tests
//!
//! ```bash
//! extforge check-prerequisites             # installation
//! extforge check-prerequisites --packaging # also requires swig
//! ```

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::builder::toolchain::{ToolchainInfo, ToolchainProbe};
use crate::core::{BuildMode, MissingTool, PlatformProfile};
use crate::util::context::GlobalContext;
use crate::util::process::{Executor, ProcessBuilder};

/// Version queries are quick; anything slower is treated as broken.
const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a single tool check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// Path to the tool (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Version string (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip)]
    pub duration: Duration,

    /// Whether this check is required or optional
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            version: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Create a failing check result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            passed: false,
            ..CheckResult::pass(name, message)
        }
    }

    /// Mark this check as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Everything `check-prerequisites` found out.
#[derive(Debug, Clone, Serialize)]
pub struct PrerequisiteReport {
    pub mode: BuildMode,
    pub platform: PlatformProfile,
    /// Companion tool checks, in the order they ran
    pub checks: Vec<CheckResult>,
    /// The probed compiler, usable or not
    pub toolchain: ToolchainInfo,
    /// Tools to install before building, in check order
    pub missing: Vec<MissingTool>,
}

impl PrerequisiteReport {
    /// Whether the pipeline may start.
    pub fn is_satisfied(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Check `cargo`, `swig` (packaging only) and the C++ compiler.
///
/// A compiler that is found but fails the header test counts as missing.
/// Missing tools are recorded in the report, never returned as errors.
pub fn check_prerequisites(
    exec: &dyn Executor,
    ctx: &GlobalContext,
    mode: BuildMode,
) -> PrerequisiteReport {
    let mut checks = Vec::new();
    let mut missing = Vec::new();

    let cargo = check_native_tool(exec, ctx);
    if !cargo.passed {
        missing.push(MissingTool::Cargo);
    }
    checks.push(cargo);

    if mode.is_packaging() {
        let swig = check_generator(exec, ctx);
        if !swig.passed {
            missing.push(MissingTool::Swig);
        }
        checks.push(swig);
    } else {
        checks.push(
            CheckResult::pass(
                ctx.config().bindings.generator.clone(),
                "skipping SWIG check (installation mode uses pre-generated files)",
            )
            .optional(),
        );
    }

    let start = Instant::now();
    let toolchain =
        ToolchainProbe::from_settings(&ctx.config().toolchain).probe(exec, ctx.platform());
    tracing::debug!("compiler probe took {:?}", start.elapsed());

    if !toolchain.found {
        tracing::debug!("no C++ compiler found");
        missing.push(MissingTool::CxxCompiler);
    } else if !toolchain.critical_failures.is_empty() {
        for failure in &toolchain.critical_failures {
            tracing::warn!("{}: {}", toolchain.command, failure);
        }
        missing.push(MissingTool::CxxCompiler);
    }

    PrerequisiteReport {
        mode,
        platform: ctx.platform(),
        checks,
        toolchain,
        missing,
    }
}

/// `cargo --version`; a failing query counts as missing.
fn check_native_tool(exec: &dyn Executor, ctx: &GlobalContext) -> CheckResult {
    let command = &ctx.config().native.command;
    let start = Instant::now();

    let Some(path) = exec.find_executable(command) else {
        return CheckResult::fail(command.clone(), "not found on PATH");
    };

    let cmd = ProcessBuilder::new(command)
        .arg("--version")
        .timeout(VERSION_TIMEOUT);
    match exec.exec(&cmd) {
        Ok(output) if output.success() => {
            let version = output.stdout.trim().to_string();
            CheckResult::pass(command.clone(), format!("Found {}", version))
                .with_version(version)
                .with_path(path)
                .with_duration(start.elapsed())
        }
        Ok(output) => {
            tracing::debug!("`{}` failed: {}", cmd.display_command(), output.stderr_tail(5));
            CheckResult::fail(command.clone(), "version check failed").with_path(path)
        }
        Err(e) => {
            tracing::debug!("`{}` could not run: {:#}", cmd.display_command(), e);
            CheckResult::fail(command.clone(), "version check failed").with_path(path)
        }
    }
}

/// `swig -version`; only absence from `PATH` counts as missing.
fn check_generator(exec: &dyn Executor, ctx: &GlobalContext) -> CheckResult {
    let command = &ctx.config().bindings.generator;
    let start = Instant::now();

    let Some(path) = exec.find_executable(command) else {
        return CheckResult::fail(command.clone(), "not found on PATH");
    };

    let cmd = ProcessBuilder::new(command)
        .arg("-version")
        .timeout(VERSION_TIMEOUT);
    let version_line = exec
        .exec(&cmd)
        .ok()
        .filter(|o| o.success())
        .and_then(|o| {
            o.stdout
                .lines()
                .find(|l| l.contains("SWIG Version"))
                .map(|l| l.trim().to_string())
        });

    let check = match version_line {
        Some(line) => CheckResult::pass(command.clone(), format!("Found {}", line)).with_version(line),
        None => CheckResult::pass(command.clone(), "Found SWIG (version check failed)"),
    };
    check.with_path(path).with_duration(start.elapsed())
}

/// Render the report the way `check-prerequisites` prints it.
pub fn format_report(report: &PrerequisiteReport, verbose: bool) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Checking build prerequisites ({} mode, {})\n",
        report.mode,
        report.platform.os.as_str()
    ));

    for check in &report.checks {
        let status = match (check.passed, check.required) {
            (true, true) => "[OK]",
            (true, false) => "[--]",
            (false, _) => "[!!]",
        };
        output.push_str(&format!("  {} {}: {}\n", status, check.name, check.message));
        if verbose {
            if let Some(path) = &check.path {
                output.push_str(&format!("       Path: {}\n", path.display()));
            }
        }
    }

    let tc = &report.toolchain;
    if !tc.found {
        output.push_str("  [!!] C++ compiler: none found\n");
        return output;
    }

    let status = if tc.is_usable() { "[OK]" } else { "[!!]" };
    output.push_str(&format!("  {} Found {} {}\n", status, tc.name, tc.version));
    output.push_str(&format!("       Command: {}\n", tc.command));
    if verbose {
        if let Some(path) = &tc.path {
            output.push_str(&format!("       Path: {}\n", path.display()));
        }
        output.push_str(&format!("       Family: {}\n", tc.family));
    }

    if tc.baseline_support {
        output.push_str("  [OK] C++11 support confirmed\n");
    } else {
        output.push_str("  [!!] C++11 support could not be verified\n");
    }

    for failure in &tc.critical_failures {
        output.push_str(&format!("  [!!] {}\n", failure));
    }
    if tc.warnings.is_empty() {
        output.push_str("  [OK] All compiler tests passed\n");
    } else {
        for warning in &tc.warnings {
            output.push_str(&format!("  [!!] {}\n", warning));
        }
    }

    output
}
