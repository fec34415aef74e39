//! Test utilities and mocks for extforge unit tests.
//!
//! [`MockExecutor`] stands in for the host: it answers `PATH` lookups from a
//! fixed tool list and returns scripted outputs for commands matched by
//! pattern, recording every call so tests can assert what did (and did not)
//! run.
//!
//! # Example
//!
//! ```rust,ignore
//! use extforge::test_support::{MockExecutor, MockProcessOutput};
//!
//! let mut exec = MockExecutor::new();
//! exec.add_tool("g++");
//! exec.expect("g++ --version", MockProcessOutput::success("g++ (GCC) 12.2.0"));
//! ```

pub mod fixtures;

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::util::process::{Executor, ProcessBuilder, ProcessOutput};

pub use fixtures::*;

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Simulate the deadline expiring.
    pub timed_out: bool,
    /// Simulate the program failing to start.
    pub spawn_error: bool,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            timed_out: false,
            spawn_error: false,
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
            timed_out: false,
            spawn_error: false,
        }
    }

    /// Create an output for a process killed at its deadline.
    pub fn timeout() -> Self {
        MockProcessOutput {
            status: -1,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: true,
            spawn_error: false,
        }
    }

    /// Create an output for a program that could not be started.
    pub fn not_spawned() -> Self {
        MockProcessOutput {
            spawn_error: true,
            ..MockProcessOutput::failure(-1, "")
        }
    }

    /// Create an output with both stdout and stderr.
    pub fn with_output(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
            timed_out: false,
            spawn_error: false,
        }
    }

    fn to_result(&self, cmd: &str) -> Result<ProcessOutput> {
        if self.spawn_error {
            bail!("failed to spawn `{}`", cmd);
        }
        Ok(ProcessOutput {
            code: if self.timed_out { None } else { Some(self.status) },
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
            timed_out: self.timed_out,
        })
    }
}

impl Default for MockProcessOutput {
    fn default() -> Self {
        MockProcessOutput::success("")
    }
}

/// Pattern for matching commands in MockExecutor.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
    /// Match using a regex pattern.
    Regex(String),
    /// Match any command.
    Any,
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
            CommandPattern::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(cmd))
                .unwrap_or(false),
            CommandPattern::Any => true,
        }
    }
}

/// Expectation for a command execution.
#[derive(Debug, Clone)]
pub struct CommandExpectation {
    /// Pattern to match against commands.
    pub pattern: CommandPattern,
    /// Output to return when matched.
    pub output: MockProcessOutput,
    /// Number of times this expectation can be used (None = unlimited).
    pub times: Option<usize>,
    /// Number of times this expectation has been used.
    pub used: usize,
}

impl CommandExpectation {
    /// Create a new expectation.
    pub fn new(pattern: CommandPattern, output: MockProcessOutput) -> Self {
        CommandExpectation {
            pattern,
            output,
            times: None,
            used: 0,
        }
    }

    /// Set the number of times this expectation can be used.
    pub fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    /// Check if this expectation can still be used.
    pub fn available(&self) -> bool {
        match self.times {
            Some(n) => self.used < n,
            None => true,
        }
    }
}

/// Mock host for testing command execution and `PATH` lookups.
///
/// Expectations are checked in insertion order; the first available match
/// wins. Unmatched commands use the default output, or fail the call when no
/// default is set.
#[derive(Debug, Default)]
pub struct MockExecutor {
    expectations: RefCell<Vec<CommandExpectation>>,
    calls: RefCell<Vec<String>>,
    default_output: Option<MockProcessOutput>,
    tools: BTreeSet<String>,
}

impl MockExecutor {
    /// Create a new mock executor with an empty `PATH`.
    pub fn new() -> Self {
        MockExecutor::default()
    }

    /// Make `name` resolvable on the fake `PATH`.
    pub fn add_tool(&mut self, name: &str) -> &mut Self {
        self.tools.insert(name.to_string());
        self
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&mut self, cmd: &str, output: MockProcessOutput) -> &mut Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::Exact(cmd.to_string()),
            output,
        ))
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&mut self, prefix: &str, output: MockProcessOutput) -> &mut Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::StartsWith(prefix.to_string()),
            output,
        ))
    }

    /// Add an expectation for a command containing a substring.
    pub fn expect_contains(&mut self, substring: &str, output: MockProcessOutput) -> &mut Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::Contains(substring.to_string()),
            output,
        ))
    }

    /// Add a custom expectation.
    pub fn expect_pattern(&mut self, expectation: CommandExpectation) -> &mut Self {
        self.expectations.get_mut().push(expectation);
        self
    }

    /// Set a default output for commands that don't match any expectation.
    pub fn set_default(&mut self, output: MockProcessOutput) -> &mut Self {
        self.default_output = Some(output);
        self
    }

    /// Get all commands that were called.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Whether any recorded command contains `needle`.
    pub fn was_called(&self, needle: &str) -> bool {
        self.calls.borrow().iter().any(|c| c.contains(needle))
    }

    /// Verify that all expectations with a specific count were satisfied.
    pub fn verify(&self) -> Result<()> {
        for (i, exp) in self.expectations.borrow().iter().enumerate() {
            if let Some(expected) = exp.times {
                if exp.used != expected {
                    bail!(
                        "expectation {} was used {} times, expected {}",
                        i,
                        exp.used,
                        expected
                    );
                }
            }
        }
        Ok(())
    }
}

impl Executor for MockExecutor {
    fn exec(&self, cmd: &ProcessBuilder) -> Result<ProcessOutput> {
        let full_cmd = cmd.display_command();
        self.calls.borrow_mut().push(full_cmd.clone());

        for exp in self.expectations.borrow_mut().iter_mut() {
            if exp.pattern.matches(&full_cmd) && exp.available() {
                exp.used += 1;
                return exp.output.to_result(&full_cmd);
            }
        }

        match self.default_output {
            Some(ref default) => default.to_result(&full_cmd),
            None => bail!("unexpected command: {}", full_cmd),
        }
    }

    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        self.tools
            .contains(name)
            .then(|| PathBuf::from("/mock/bin").join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_available_expectation_wins() {
        let mut exec = MockExecutor::new();
        exec.expect_pattern(
            CommandExpectation::new(
                CommandPattern::StartsWith("g++".into()),
                MockProcessOutput::failure(1, "first"),
            )
            .times(1),
        );
        exec.expect_prefix("g++", MockProcessOutput::success("second"));

        let cmd = ProcessBuilder::new("g++").arg("--version");
        assert_eq!(exec.exec(&cmd).unwrap().stderr, "first");
        assert_eq!(exec.exec(&cmd).unwrap().stdout, "second");
        assert!(exec.verify().is_ok());
        assert_eq!(exec.calls().len(), 2);
    }

    #[test]
    fn test_unexpected_command_without_default_errors() {
        let exec = MockExecutor::new();
        assert!(exec.exec(&ProcessBuilder::new("swig")).is_err());
        assert!(exec.was_called("swig"));
    }

    #[test]
    fn test_fake_path() {
        let mut exec = MockExecutor::new();
        exec.add_tool("cargo");
        assert!(exec.find_executable("cargo").is_some());
        assert!(exec.find_executable("swig").is_none());
    }

    #[test]
    fn test_timeout_and_spawn_error() {
        let mut exec = MockExecutor::new();
        exec.expect("slow", MockProcessOutput::timeout());
        exec.expect("ghost", MockProcessOutput::not_spawned());

        let out = exec.exec(&ProcessBuilder::new("slow")).unwrap();
        assert!(out.timed_out);
        assert!(!out.success());
        assert!(exec.exec(&ProcessBuilder::new("ghost")).is_err());
    }
}
