//! Configuration file support for extforge.
//!
//! extforge reads two configuration files:
//! - Global: `~/.extforge/config.toml` - User-wide defaults
//! - Project: `.extforge/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, key by key. Every
//! setting has a default matching the conventional project layout, so
//! neither file is required.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Full extforge configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory layout
    pub paths: PathsConfig,

    /// Native static library naming
    pub library: LibraryConfig,

    /// Native library build command
    pub native: NativeConfig,

    /// Interface binding generator
    pub bindings: BindingsConfig,

    /// Bridge headers produced by the native build
    pub bridge: BridgeConfig,

    /// Final extension module compile
    pub extension: ExtensionConfig,

    /// Compiler overrides
    pub toolchain: ToolchainSettings,
}

/// Directory layout, relative to the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Where the library, bridge headers and extension module are placed.
    ///
    /// Defaults to the source directory for compatibility with existing
    /// projects; point it at a build-only directory to keep sources clean.
    pub output_dir: PathBuf,

    /// Where the native build leaves its static library
    pub native_target_dir: PathBuf,

    /// Where the native build leaves generated bridge headers
    pub bridge_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            output_dir: PathBuf::from("src"),
            native_target_dir: PathBuf::from("target/debug"),
            bridge_dir: PathBuf::from("target/cxxbridge"),
        }
    }
}

/// How the static library is named on Windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryNaming {
    /// Use the first candidate name found on disk (MSVC name first).
    #[default]
    Auto,
    /// Only accept the MSVC name (`<name>.lib`).
    Msvc,
    /// Only accept MinGW names (`lib<name>.a`, `lib<name>.lib`).
    Mingw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Library base name (`signer` gives `libsigner.a` / `signer.lib`)
    pub name: String,

    /// Windows naming convention
    pub naming: LibraryNaming,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig {
            name: "signer".to_string(),
            naming: LibraryNaming::Auto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeConfig {
    /// Build tool executable
    pub command: String,

    /// Build tool arguments
    pub args: Vec<String>,

    /// Upper bound for the native build, in seconds
    pub timeout_secs: u64,
}

impl Default for NativeConfig {
    fn default() -> Self {
        NativeConfig {
            command: "cargo".to_string(),
            args: vec!["build".to_string()],
            timeout_secs: 600,
        }
    }
}

impl NativeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingsConfig {
    /// Generator executable
    pub generator: String,

    /// Arguments placed before the interface file
    pub args: Vec<String>,

    /// Interface specification file
    pub interface: PathBuf,

    /// Files the generator is expected to produce
    pub outputs: Vec<PathBuf>,

    /// Upper bound for one generator run, in seconds
    pub timeout_secs: u64,
}

impl Default for BindingsConfig {
    fn default() -> Self {
        BindingsConfig {
            generator: "swig".to_string(),
            args: vec!["-c++".to_string(), "-python".to_string()],
            interface: PathBuf::from("src/signer.i"),
            outputs: vec![
                PathBuf::from("src/signer_wrap.cxx"),
                PathBuf::from("src/CardanoSigner.py"),
            ],
            timeout_secs: 120,
        }
    }
}

impl BindingsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// A header copied from the bridge directory into the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderCopy {
    /// Path relative to `paths.bridge_dir`
    pub from: PathBuf,
    /// File name inside `paths.output_dir`
    pub to: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub headers: Vec<HeaderCopy>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            headers: vec![
                HeaderCopy {
                    from: PathBuf::from("signer/src/lib.rs.h"),
                    to: PathBuf::from("lib.rs.h"),
                },
                HeaderCopy {
                    from: PathBuf::from("rust/cxx.h"),
                    to: PathBuf::from("cxx.h"),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    /// Extension module name (without platform suffix)
    pub module: String,

    /// Source files or glob patterns, relative to the project root
    pub sources: Vec<String>,

    /// Extra include directories; the output directory is always included
    pub include_dirs: Vec<PathBuf>,

    /// Extra compiler/linker arguments appended verbatim
    pub extra_args: Vec<String>,

    /// Upper bound for the final compile, in seconds
    pub timeout_secs: u64,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        ExtensionConfig {
            module: "_CardanoSigner".to_string(),
            sources: vec![
                "src/signer_wrap.cxx".to_string(),
                "src/signer.cpp".to_string(),
            ],
            include_dirs: vec![PathBuf::from("src")],
            extra_args: Vec::new(),
            timeout_secs: 300,
        }
    }
}

impl ExtensionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Compiler overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// C++ compiler probed before the built-in candidate list
    pub cxx: Option<String>,
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse configuration")
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.extforge/config.toml)
/// 2. Global config (~/.extforge/config.toml)
/// 3. Defaults
///
/// Missing files are skipped; a file that exists but does not parse is an
/// error.
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Result<Config> {
    let mut merged = toml::Table::new();

    for path in global_path.into_iter().chain(std::iter::once(project_path)) {
        if !path.exists() {
            continue;
        }
        tracing::debug!("loading config from {}", path.display());
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let table: toml::Table = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;
        merge_tables(&mut merged, table);
    }

    toml::Value::Table(merged)
        .try_into()
        .context("invalid configuration")
}

/// Merge `overlay` into `base`; nested tables merge, everything else replaces.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Get the global extforge config directory (~/.extforge).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".extforge"))
}

/// Get the global config path (~/.extforge/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.extforge/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".extforge").join("config.toml")
}
