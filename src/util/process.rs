//! Subprocess execution utilities.
//!
//! Every external tool the pipeline touches goes through [`ProcessBuilder`],
//! and every invocation goes through an [`Executor`] so that probe and
//! pipeline logic can be exercised without real compilers.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use miette::Diagnostic;
use thiserror::Error;

/// How often a child with a deadline is polled.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
            timeout: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Bound the wall-clock time the process may run.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get the working directory, if one was set.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Get the timeout, if one was set.
    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Build the Command.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute the command and wait for completion or the timeout.
    ///
    /// Output is captured through anonymous temp files rather than pipes, so a
    /// killed child that leaves grandchildren behind cannot block the caller.
    /// An `Err` means the process could not be started at all.
    pub fn exec(&self) -> Result<ProcessOutput> {
        let mut cmd = self.build_command();

        let mut stdout = tempfile::tempfile().context("failed to create stdout capture file")?;
        let mut stderr = tempfile::tempfile().context("failed to create stderr capture file")?;

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::from(stdout.try_clone()?));
        cmd.stderr(Stdio::from(stderr.try_clone()?));

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        let (status, timed_out) = match self.timeout {
            Some(limit) => wait_with_deadline(&mut child, limit)
                .with_context(|| format!("failed to wait for `{}`", self.program.display()))?,
            None => (
                child
                    .wait()
                    .with_context(|| format!("failed to wait for `{}`", self.program.display()))?,
                false,
            ),
        };

        // Drop the parent's copies of the capture handles held by `cmd`.
        drop(cmd);

        Ok(ProcessOutput {
            code: if timed_out { None } else { status.code() },
            stdout: read_capture(&mut stdout),
            stderr: read_capture(&mut stderr),
            timed_out,
        })
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Captured result of a finished (or killed) process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was killed or terminated by a signal.
    pub code: Option<i32>,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Whether the deadline expired and the process was killed.
    pub timed_out: bool,
}

impl ProcessOutput {
    /// A zero exit status within the deadline.
    pub fn success(&self) -> bool {
        !self.timed_out && self.code == Some(0)
    }

    /// The last `n` non-empty lines of stderr, for error messages.
    pub fn stderr_tail(&self, n: usize) -> String {
        let lines: Vec<&str> = self
            .stderr
            .lines()
            .filter(|l| !l.trim().is_empty())
            .collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].join("\n")
    }
}

/// A required command that did not finish successfully.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ProcessError {
    #[error("failed to run `{command}`: {message}")]
    #[diagnostic(code(extforge::process::spawn), help("is the tool installed and on PATH?"))]
    Spawn { command: String, message: String },

    #[error("`{command}` timed out after {secs}s")]
    #[diagnostic(code(extforge::process::timeout))]
    TimedOut { command: String, secs: u64 },

    #[error("`{command}` failed with exit code {}\n{stderr}", display_code(.code))]
    #[diagnostic(code(extforge::process::failed))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "(terminated by signal)".to_string())
}

/// Lines of stderr kept in [`ProcessError::Failed`].
const STDERR_TAIL_LINES: usize = 20;

impl ProcessError {
    /// Run `cmd` through `exec` and require success.
    pub fn check(exec: &dyn Executor, cmd: &ProcessBuilder) -> Result<ProcessOutput, ProcessError> {
        let command = cmd.display_command();
        let output = exec.exec(cmd).map_err(|e| ProcessError::Spawn {
            command: command.clone(),
            message: format!("{:#}", e),
        })?;

        if output.timed_out {
            return Err(ProcessError::TimedOut {
                command,
                secs: cmd.get_timeout().map(|t| t.as_secs()).unwrap_or_default(),
            });
        }
        if !output.success() {
            return Err(ProcessError::Failed {
                command,
                code: output.code,
                stderr: output.stderr_tail(STDERR_TAIL_LINES),
            });
        }
        Ok(output)
    }
}

/// Runs processes and looks up executables.
///
/// The probe, generator and pipeline only talk to the outside world through
/// this trait.
pub trait Executor {
    /// Run a command to completion (or its timeout).
    fn exec(&self, cmd: &ProcessBuilder) -> Result<ProcessOutput>;

    /// Resolve an executable name against `PATH`.
    fn find_executable(&self, name: &str) -> Option<PathBuf>;
}

/// The real host: spawns processes and searches `PATH` with `which`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn exec(&self, cmd: &ProcessBuilder) -> Result<ProcessOutput> {
        tracing::debug!("running `{}`", cmd.display_command());
        let output = cmd.exec()?;
        if output.timed_out {
            tracing::debug!("`{}` timed out", cmd.display_command());
        }
        Ok(output)
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        find_executable(name)
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

fn wait_with_deadline(child: &mut Child, limit: Duration) -> std::io::Result<(ExitStatus, bool)> {
    let deadline = Instant::now().checked_add(limit);

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status, false));
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            let _ = child.kill();
            let status = child.wait()?;
            return Ok((status, true));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn read_capture(file: &mut File) -> String {
    let mut buf = Vec::new();
    if file.seek(SeekFrom::Start(0)).is_ok() {
        let _ = file.read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).into_owned()
}
