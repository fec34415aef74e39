//! Compiler version banners.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use semver::Version;

use crate::util::process::Executor;

use super::{CompilerDriver, CompilerFamily};

const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

static GCC_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:gcc|g\+\+)[^\n]*?(\d+)\.(\d+)\.(\d+)").expect("valid gcc version regex")
});

static CLANG_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"clang.*?(\d+)\.(\d+)\.(\d+)").expect("valid clang version regex")
});

/// Oldest GCC with complete C++11 support.
const GCC_MIN: Version = Version::new(4, 7, 0);
/// Oldest Clang with complete C++11 support.
const CLANG_MIN: Version = Version::new(3, 3, 0);

/// What a compiler said about its version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerVersion {
    /// One-line description for reports
    pub line: String,
    /// Full banner text, empty when the query failed
    pub raw: String,
}

/// Ask the compiler for its version.
///
/// Never fails: an unanswered query yields `(version unknown)`.
pub fn query_version(exec: &dyn Executor, driver: &dyn CompilerDriver) -> CompilerVersion {
    let cmd = driver.version_command().timeout(VERSION_TIMEOUT);
    let output = exec.exec(&cmd).ok().filter(|o| !o.timed_out);

    if driver.family() == CompilerFamily::Msvc {
        // `cl` with no input exits non-zero but still prints its banner.
        let Some(output) = output else {
            return unknown();
        };
        let banner = format!("{}{}", output.stderr, output.stdout);
        if !banner.contains("Microsoft") {
            return CompilerVersion {
                line: "Microsoft Visual C++".to_string(),
                raw: banner,
            };
        }
        let line = banner
            .lines()
            .find(|l| l.contains("Version"))
            .map(|l| l.trim().to_string())
            .unwrap_or_else(|| "Microsoft Visual C++ (version unknown)".to_string());
        return CompilerVersion { line, raw: banner };
    }

    match output {
        Some(output) if output.success() => {
            let line = output
                .stdout
                .lines()
                .next()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "(version unknown)".to_string());
            CompilerVersion {
                line,
                raw: output.stdout,
            }
        }
        _ => unknown(),
    }
}

fn unknown() -> CompilerVersion {
    CompilerVersion {
        line: "(version unknown)".to_string(),
        raw: String::new(),
    }
}

/// Extract a version number from a GCC or Clang banner.
pub fn parse_version(family: CompilerFamily, banner: &str) -> Option<Version> {
    let lowered = banner.to_lowercase();
    let re = match family {
        CompilerFamily::Gcc => &*GCC_VERSION,
        CompilerFamily::Clang => &*CLANG_VERSION,
        _ => return None,
    };
    let caps = re.captures(&lowered)?;
    let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
    Some(Version::new(part(1)?, part(2)?, part(3)?))
}

/// Warning for compilers too old for full C++11 support.
pub fn old_version_warning(family: CompilerFamily, banner: &str) -> Option<String> {
    let version = parse_version(family, banner)?;
    match family {
        CompilerFamily::Gcc if version < GCC_MIN => {
            Some(format!("GCC {} is quite old, consider upgrading", version))
        }
        CompilerFamily::Clang if version < CLANG_MIN => {
            Some(format!("Clang {} may not fully support C++11", version))
        }
        _ => None,
    }
}
