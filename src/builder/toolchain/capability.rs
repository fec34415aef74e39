//! Compiler capability checks.
//!
//! Each check writes a tiny C++ program into its own temporary directory,
//! compiles it (and sometimes runs it) under a deadline, and turns the
//! outcome into warnings or critical failures. A timeout or a compiler that
//! fails to start counts as a failed check.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::PlatformProfile;
use crate::util::process::{Executor, ProcessBuilder};

use super::{version, CompilerDriver, ProgramOptions};

const BASELINE_COMPILE_TIMEOUT: Duration = Duration::from_secs(30);
const BASELINE_RUN_TIMEOUT: Duration = Duration::from_secs(10);
const PIC_TIMEOUT: Duration = Duration::from_secs(5);
const HEADERS_TIMEOUT: Duration = Duration::from_secs(15);
const INTEROP_COMPILE_TIMEOUT: Duration = Duration::from_secs(15);
const INTEROP_RUN_TIMEOUT: Duration = Duration::from_secs(5);
const THREADING_TIMEOUT: Duration = Duration::from_secs(10);

pub const PIC_UNCERTAIN: &str = "Position Independent Code (-fPIC) support uncertain";
pub const HEADERS_CRITICAL: &str = "Cannot compile basic C++ headers";
pub const HEADERS_WARNING: &str = "Standard library headers may be missing or incompatible";
pub const INTEROP_COMPILE_WARNING: &str = "May have issues with Rust-C++ bridge features";
pub const INTEROP_RUN_WARNING: &str = "Rust-C++ bridge compatibility test failed at runtime";
pub const THREADING_WARNING: &str =
    "Threading support may be limited (missing -pthread or thread library)";

const BASELINE_PROGRAM: &str = r#"#include <iostream>
#include <memory>
#include <vector>

int main() {
    auto values = std::make_shared<std::vector<int>>();
    values->push_back(1);
    values->push_back(2);
    int* unused = nullptr;
    auto twice = [](int x) { return x * 2; };
    int total = 0;
    for (auto v : *values) {
        total += twice(v);
    }
    std::cout << total << std::endl;
    return (total == 6 && unused == nullptr) ? 0 : 1;
}
"#;

const HEADERS_PROGRAM: &str = r#"#include <iostream>
#include <vector>
#include <string>
#include <memory>
#include <cstring>

int main() {
    std::vector<std::string> items;
    items.push_back("header");
    std::unique_ptr<char[]> buf(new char[8]);
    std::strcpy(buf.get(), "ok");
    std::cout << items.size() << buf.get() << std::endl;
    return 0;
}
"#;

const INTEROP_PROGRAM: &str = r#"#include <cstdint>
#include <exception>
#include <iostream>
#include <string>
#include <utility>

extern "C" {
    std::int32_t bridge_add(std::int32_t a, std::int32_t b) { return a + b; }
}

class BridgeError : public std::exception {
public:
    explicit BridgeError(std::string message) : message_(std::move(message)) {}
    const char* what() const noexcept override { return message_.c_str(); }
private:
    std::string message_;
};

int main() {
    std::int8_t i8 = -8;
    std::uint8_t u8 = 8;
    std::int16_t i16 = -16;
    std::uint16_t u16 = 16;
    std::int32_t i32 = bridge_add(-16, -16);
    std::uint32_t u32 = 32;
    std::int64_t i64 = -64;
    std::uint64_t u64 = 64;
    try {
        throw BridgeError("bridge");
    } catch (const BridgeError& e) {
        if (std::string(e.what()) != "bridge") {
            return 1;
        }
    }
    std::cout << static_cast<int>(i8) << static_cast<int>(u8) << i16 << u16
              << i32 << u32 << i64 << u64 << std::endl;
    return 0;
}
"#;

const THREADING_PROGRAM: &str = r#"#include <atomic>
#include <mutex>
#include <thread>

int main() {
    std::atomic<int> counter(0);
    std::mutex lock;
    std::thread worker([&]() {
        std::lock_guard<std::mutex> guard(lock);
        counter++;
    });
    worker.join();
    return counter.load() == 1 ? 0 : 1;
}
"#;

/// The individual checks run against a compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityCheck {
    /// C++11 program compiles and runs
    Baseline,
    /// Position-independent code flag accepted (GCC/Clang)
    Pic,
    /// Standard headers compile
    Headers,
    /// Bridge-style C/C++ interop compiles and runs
    Interop,
    /// Threads compile and link (GCC/Clang)
    Threading,
}

impl CapabilityCheck {
    /// Stem used for the check's scratch files.
    pub fn slug(&self) -> &'static str {
        match self {
            CapabilityCheck::Baseline => "baseline",
            CapabilityCheck::Pic => "pic",
            CapabilityCheck::Headers => "headers",
            CapabilityCheck::Interop => "interop",
            CapabilityCheck::Threading => "threading",
        }
    }
}

/// Outcome of running every applicable check against one compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityTestResult {
    pub baseline_support: bool,
    pub warnings: Vec<String>,
    pub critical_failures: Vec<String>,
}

impl CapabilityTestResult {
    pub fn is_usable(&self) -> bool {
        self.critical_failures.is_empty()
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// A source file and its executable inside a private temporary directory.
///
/// Both files go away when this is dropped, whatever the check's outcome.
struct ScratchProgram {
    dir: TempDir,
    source: PathBuf,
    output: PathBuf,
}

impl ScratchProgram {
    fn new(
        compiler: &str,
        check: CapabilityCheck,
        code: &str,
        platform: PlatformProfile,
    ) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("extforge-probe-{}-", scratch_tag(compiler)))
            .tempdir()
            .context("failed to create scratch directory")?;

        let source = dir.path().join(format!("{}.cpp", check.slug()));
        std::fs::write(&source, code)
            .with_context(|| format!("failed to write {}", source.display()))?;

        let output = dir
            .path()
            .join(format!("{}-bin{}", check.slug(), platform.exe_suffix()));

        Ok(ScratchProgram {
            dir,
            source,
            output,
        })
    }

    fn dir(&self) -> &Path {
        self.dir.path()
    }

    fn compile(&self, driver: &dyn CompilerDriver, opts: ProgramOptions) -> ProcessBuilder {
        // MSVC drops object files into the working directory.
        driver
            .executable_command(&self.source, &self.output, opts)
            .cwd(self.dir())
    }

    fn run(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.output).cwd(self.dir())
    }
}

/// File-name-safe tag for a compiler command.
pub(crate) fn scratch_tag(compiler: &str) -> String {
    let name = Path::new(compiler)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(compiler);
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Runs the capability checks against a compiler.
pub struct CapabilityTester<'a> {
    exec: &'a dyn Executor,
    platform: PlatformProfile,
}

impl<'a> CapabilityTester<'a> {
    pub fn new(exec: &'a dyn Executor, platform: PlatformProfile) -> Self {
        CapabilityTester { exec, platform }
    }

    /// Run all applicable checks.
    ///
    /// `version_banner` is the compiler's `--version` output, used for the
    /// old-version check; pass an empty string to skip it.
    pub fn test(&self, driver: &dyn CompilerDriver, version_banner: &str) -> CapabilityTestResult {
        let mut result = CapabilityTestResult {
            baseline_support: self.check_baseline(driver),
            ..CapabilityTestResult::default()
        };

        let gnu_like = driver.family().is_gnu_like();

        if gnu_like {
            self.check_pic(driver, &mut result);
        }
        self.check_headers(driver, &mut result);
        if let Some(warning) = version::old_version_warning(driver.family(), version_banner) {
            result.warn(warning);
        }
        self.check_interop(driver, &mut result);
        if gnu_like {
            self.check_threading(driver, &mut result);
        }

        tracing::debug!(
            "{}: baseline={} warnings={} critical={}",
            driver.command(),
            result.baseline_support,
            result.warnings.len(),
            result.critical_failures.len()
        );

        result
    }

    fn check_baseline(&self, driver: &dyn CompilerDriver) -> bool {
        let Some(program) = self.scratch(driver, CapabilityCheck::Baseline, BASELINE_PROGRAM)
        else {
            return false;
        };

        let opts = ProgramOptions {
            cxx11: true,
            threads: false,
        };
        self.succeeds(&program.compile(driver, opts).timeout(BASELINE_COMPILE_TIMEOUT))
            && self.succeeds(&program.run().timeout(BASELINE_RUN_TIMEOUT))
    }

    fn check_pic(&self, driver: &dyn CompilerDriver, result: &mut CapabilityTestResult) {
        let Some(cmd) = driver.pic_probe_command() else {
            return;
        };
        if !self.succeeds(&cmd.timeout(PIC_TIMEOUT)) {
            result.warn(PIC_UNCERTAIN);
        }
    }

    fn check_headers(&self, driver: &dyn CompilerDriver, result: &mut CapabilityTestResult) {
        let compiled = self
            .scratch(driver, CapabilityCheck::Headers, HEADERS_PROGRAM)
            .is_some_and(|program| {
                self.succeeds(
                    &program
                        .compile(driver, ProgramOptions::default())
                        .timeout(HEADERS_TIMEOUT),
                )
            });

        if !compiled {
            result.critical_failures.push(HEADERS_CRITICAL.to_string());
            result.warn(HEADERS_WARNING);
        }
    }

    fn check_interop(&self, driver: &dyn CompilerDriver, result: &mut CapabilityTestResult) {
        let Some(program) = self.scratch(driver, CapabilityCheck::Interop, INTEROP_PROGRAM) else {
            result.warn(INTEROP_COMPILE_WARNING);
            return;
        };

        let opts = ProgramOptions {
            cxx11: true,
            threads: false,
        };
        if !self.succeeds(&program.compile(driver, opts).timeout(INTEROP_COMPILE_TIMEOUT)) {
            result.warn(INTEROP_COMPILE_WARNING);
        } else if !self.succeeds(&program.run().timeout(INTEROP_RUN_TIMEOUT)) {
            result.warn(INTEROP_RUN_WARNING);
        }
    }

    fn check_threading(&self, driver: &dyn CompilerDriver, result: &mut CapabilityTestResult) {
        let opts = ProgramOptions {
            cxx11: true,
            threads: true,
        };
        let compiled = self
            .scratch(driver, CapabilityCheck::Threading, THREADING_PROGRAM)
            .is_some_and(|program| {
                self.succeeds(&program.compile(driver, opts).timeout(THREADING_TIMEOUT))
            });

        if !compiled {
            result.warn(THREADING_WARNING);
        }
    }

    fn scratch(
        &self,
        driver: &dyn CompilerDriver,
        check: CapabilityCheck,
        code: &str,
    ) -> Option<ScratchProgram> {
        match ScratchProgram::new(driver.command(), check, code, self.platform) {
            Ok(program) => Some(program),
            Err(e) => {
                tracing::debug!("{} check skipped: {:#}", check.slug(), e);
                None
            }
        }
    }

    /// Exit status zero within the deadline. Spawn errors count as failure.
    fn succeeds(&self, cmd: &ProcessBuilder) -> bool {
        match self.exec.exec(cmd) {
            Ok(output) => output.success(),
            Err(e) => {
                tracing::debug!("{:#}", e);
                false
            }
        }
    }
}
