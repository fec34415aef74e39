//! Global context for extforge operations.
//!
//! Provides centralized access to the project root, configuration and host
//! platform for a single run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::PlatformProfile;
use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Everything a command needs to know about where it runs.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    project_root: PathBuf,
    config: Config,
    platform: PlatformProfile,
}

impl GlobalContext {
    /// Create a context rooted at `project_dir` (or the current directory),
    /// loading the merged configuration.
    pub fn new(project_dir: Option<&Path>) -> Result<Self> {
        let project_root = match project_dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().context("failed to get current directory")?,
        };

        if !project_root.is_dir() {
            anyhow::bail!("project directory not found: {}", project_root.display());
        }

        let global = global_config_path();
        let config = load_config(global.as_deref(), &project_config_path(&project_root))?;

        Ok(GlobalContext::with_config(project_root, config))
    }

    /// Create a context from an already loaded configuration.
    pub fn with_config(project_root: PathBuf, config: Config) -> Self {
        GlobalContext {
            project_root,
            config,
            platform: PlatformProfile::host(),
        }
    }

    /// Override the detected platform.
    pub fn with_platform(mut self, platform: PlatformProfile) -> Self {
        self.platform = platform;
        self
    }

    /// Redirect the artifact destination (`--output-dir`).
    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.config.paths.output_dir = dir;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn platform(&self) -> PlatformProfile {
        self.platform
    }

    /// Resolve a project-relative path (absolute paths pass through).
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.project_root.join(path)
    }

    /// Directory receiving the library, headers and extension module.
    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.config.paths.output_dir)
    }

    /// Directory where the native build leaves its static library.
    pub fn native_target_dir(&self) -> PathBuf {
        self.resolve(&self.config.paths.native_target_dir)
    }

    /// Directory where the native build leaves its bridge headers.
    pub fn bridge_dir(&self) -> PathBuf {
        self.resolve(&self.config.paths.bridge_dir)
    }

    /// Path of the interface specification file.
    pub fn interface_file(&self) -> PathBuf {
        self.resolve(&self.config.bindings.interface)
    }

    /// Paths of the files the binding generator produces.
    pub fn binding_outputs(&self) -> Vec<PathBuf> {
        self.config
            .bindings
            .outputs
            .iter()
            .map(|p| self.resolve(p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_resolve_against_root() {
        let ctx = GlobalContext::with_config(PathBuf::from("/proj"), Config::default());
        assert_eq!(ctx.output_dir(), PathBuf::from("/proj/src"));
        assert_eq!(ctx.native_target_dir(), PathBuf::from("/proj/target/debug"));
        assert_eq!(ctx.interface_file(), PathBuf::from("/proj/src/signer.i"));
        assert_eq!(
            ctx.binding_outputs(),
            vec![
                PathBuf::from("/proj/src/signer_wrap.cxx"),
                PathBuf::from("/proj/src/CardanoSigner.py"),
            ]
        );
    }

    #[test]
    fn test_output_dir_override() {
        let ctx = GlobalContext::with_config(PathBuf::from("/proj"), Config::default())
            .with_output_dir(PathBuf::from("build/out"));
        assert_eq!(ctx.output_dir(), PathBuf::from("/proj/build/out"));

        let ctx = ctx.with_output_dir(PathBuf::from("/elsewhere"));
        assert_eq!(ctx.output_dir(), PathBuf::from("/elsewhere"));
    }

    #[test]
    fn test_new_reads_project_config() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(".extforge")).unwrap();
        std::fs::write(
            tmp.path().join(".extforge/config.toml"),
            "[library]\nname = \"wallet\"\n",
        )
        .unwrap();

        let ctx = GlobalContext::new(Some(tmp.path())).unwrap();
        assert_eq!(ctx.config().library.name, "wallet");
    }

    #[test]
    fn test_new_rejects_missing_directory() {
        let tmp = TempDir::new().unwrap();
        assert!(GlobalContext::new(Some(&tmp.path().join("missing"))).is_err());
    }
}
