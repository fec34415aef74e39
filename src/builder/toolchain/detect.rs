//! Toolchain detection.

use crate::core::PlatformProfile;
use crate::util::config::ToolchainSettings;
use crate::util::process::Executor;

use super::{default_candidates, CompilerCandidate, ProbeStrategy, ToolchainInfo};

/// Tries compiler strategies in priority order.
pub struct ToolchainProbe {
    strategies: Vec<Box<dyn ProbeStrategy>>,
}

impl ToolchainProbe {
    pub fn new(strategies: Vec<Box<dyn ProbeStrategy>>) -> Self {
        ToolchainProbe { strategies }
    }

    /// Probe only the built-in candidate list.
    pub fn with_defaults() -> Self {
        ToolchainProbe::with_overrides(&[])
    }

    /// Probe configured compilers first, then the built-in list:
    /// 1. `[toolchain] cxx`
    /// 2. `CXX` environment variable
    /// 3. Built-in candidates
    pub fn from_settings(settings: &ToolchainSettings) -> Self {
        let env_cxx = std::env::var("CXX").ok().filter(|v| !v.trim().is_empty());
        let overrides: Vec<String> = settings.cxx.iter().cloned().chain(env_cxx).collect();
        ToolchainProbe::with_overrides(&overrides)
    }

    /// Probe `overrides` (in order) ahead of the built-in list.
    pub fn with_overrides(overrides: &[String]) -> Self {
        let mut candidates: Vec<CompilerCandidate> =
            overrides.iter().map(CompilerCandidate::custom).collect();

        for candidate in default_candidates() {
            if !candidates.iter().any(|c| c.command == candidate.command) {
                candidates.push(candidate);
            }
        }

        ToolchainProbe::new(
            candidates
                .into_iter()
                .map(|c| Box::new(c) as Box<dyn ProbeStrategy>)
                .collect(),
        )
    }

    /// Commands in the order they will be tried.
    pub fn commands(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.command()).collect()
    }

    /// Find the first usable compiler.
    ///
    /// Probing stops at the first fully capable compiler: the baseline
    /// dialect compiles and nothing critical failed. Any other compiler that
    /// was found is remembered and probing moves on; if nothing better turns
    /// up, the last such result is returned so the caller can report what
    /// went wrong. With no compiler on `PATH` at all, returns
    /// [`ToolchainInfo::not_found`].
    pub fn probe(&self, exec: &dyn Executor, platform: PlatformProfile) -> ToolchainInfo {
        let mut partial: Option<ToolchainInfo> = None;

        for strategy in &self.strategies {
            let info = strategy.probe(exec, platform);
            if !info.found {
                continue;
            }

            if info.is_fully_capable() {
                tracing::debug!("selected {} ({})", info.command, info.version);
                return info;
            }

            if info.baseline_support {
                tracing::debug!(
                    "{} unusable: {}",
                    info.command,
                    info.critical_failures.join("; ")
                );
            } else {
                tracing::debug!("{} failed the C++11 baseline test", info.command);
            }
            partial = Some(info);
        }

        partial.unwrap_or_else(ToolchainInfo::not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::toolchain::capability::HEADERS_CRITICAL;
    use crate::builder::toolchain::{CapabilityCheck, CompilerFamily};
    use crate::core::Os;
    use crate::test_support::{compiler_outputs, script_compiler, MockExecutor};

    fn linux() -> PlatformProfile {
        PlatformProfile::new(Os::Linux)
    }

    #[test]
    fn test_empty_path_is_not_found() {
        let exec = MockExecutor::new();
        let info = ToolchainProbe::with_defaults().probe(&exec, linux());

        assert!(!info.found);
        assert!(info.command.is_empty());
        assert!(info.warnings.is_empty());
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn test_first_capable_candidate_wins() {
        let mut exec = MockExecutor::new();
        exec.expect("g++ --version", compiler_outputs::gcc_version("12.2.0"));
        script_compiler(&mut exec, "g++", &[]);
        script_compiler(&mut exec, "clang++", &[]);

        let info = ToolchainProbe::with_defaults().probe(&exec, linux());

        assert!(info.is_fully_capable());
        assert_eq!(info.command, "g++");
        assert_eq!(info.name, "GNU G++");
        assert_eq!(info.version, "g++ (GCC) 12.2.0");
        assert_eq!(info.family, CompilerFamily::Gcc);
        assert!(!exec.was_called("clang++"));
    }

    #[test]
    fn test_critical_failure_moves_to_next_candidate() {
        let mut exec = MockExecutor::new();
        script_compiler(&mut exec, "g++", &[CapabilityCheck::Headers]);
        script_compiler(&mut exec, "clang++", &[]);

        let info = ToolchainProbe::with_defaults().probe(&exec, linux());

        assert_eq!(info.command, "clang++");
        assert!(info.critical_failures.is_empty());
    }

    #[test]
    fn test_baseline_failure_moves_to_next_candidate() {
        let mut exec = MockExecutor::new();
        script_compiler(&mut exec, "g++", &[CapabilityCheck::Baseline]);
        script_compiler(&mut exec, "clang++", &[]);

        let info = ToolchainProbe::with_defaults().probe(&exec, linux());

        assert_eq!(info.command, "clang++");
        assert!(info.is_fully_capable());
    }

    #[test]
    fn test_baseline_failure_everywhere_returns_last_found() {
        let mut exec = MockExecutor::new();
        script_compiler(&mut exec, "g++", &[CapabilityCheck::Baseline]);

        let info = ToolchainProbe::with_defaults().probe(&exec, linux());

        assert!(info.found);
        assert_eq!(info.command, "g++");
        assert!(!info.baseline_support);
        assert!(!info.is_fully_capable());
    }

    #[test]
    fn test_all_candidates_failing_returns_last_partial() {
        let mut exec = MockExecutor::new();
        script_compiler(&mut exec, "g++", &[CapabilityCheck::Headers]);
        script_compiler(&mut exec, "cc", &[CapabilityCheck::Headers]);

        let info = ToolchainProbe::with_defaults().probe(&exec, linux());

        assert!(info.found);
        assert_eq!(info.command, "cc");
        assert_eq!(info.critical_failures, vec![HEADERS_CRITICAL.to_string()]);
        assert!(!info.is_usable());
    }

    #[test]
    fn test_override_probed_first_without_duplicates() {
        let probe = ToolchainProbe::with_overrides(&["clang++".to_string()]);
        let commands = probe.commands();

        assert_eq!(commands[0], "clang++");
        assert_eq!(commands.iter().filter(|c| **c == "clang++").count(), 1);
        assert_eq!(commands.len(), 10);
    }

    #[test]
    fn test_override_with_custom_command() {
        let mut exec = MockExecutor::new();
        script_compiler(&mut exec, "x86_64-linux-gnu-g++", &[]);
        script_compiler(&mut exec, "g++", &[]);

        let probe = ToolchainProbe::with_overrides(&["x86_64-linux-gnu-g++".to_string()]);
        let info = probe.probe(&exec, linux());

        assert_eq!(info.command, "x86_64-linux-gnu-g++");
        assert_eq!(info.family, CompilerFamily::Gcc);
        assert!(info.name.contains("configured"));
    }

    #[test]
    fn test_config_setting_precedes_defaults() {
        let settings = ToolchainSettings {
            cxx: Some("clang++".to_string()),
        };
        let probe = ToolchainProbe::from_settings(&settings);
        assert_eq!(probe.commands()[0], "clang++");
    }
}
