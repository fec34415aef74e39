//! Test fixtures for common test scenarios.
//!
//! [`ProjectFixture`] lays out an extension project in a temporary directory
//! using the default configuration's paths. [`script_compiler`] teaches a
//! [`MockExecutor`] to answer every capability check for one compiler.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::builder::toolchain::capability::scratch_tag;
use crate::builder::toolchain::{CapabilityCheck, CompilerFamily};
use crate::core::{Os, PlatformProfile};
use crate::util::config::Config;
use crate::util::context::GlobalContext;

use super::{CommandExpectation, CommandPattern, MockExecutor, MockProcessOutput};

/// A project tree on disk.
#[derive(Debug)]
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    /// Create an empty project.
    pub fn new() -> Self {
        ProjectFixture {
            dir: TempDir::new().expect("failed to create fixture directory"),
        }
    }

    /// A project where every pipeline input already exists.
    pub fn complete() -> Self {
        ProjectFixture::new()
            .with_interface()
            .with_native_library("libsigner.a")
            .with_bridge_headers()
            .with_binding_outputs()
            .with_extension_sources()
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a project-relative file.
    pub fn path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root().join(rel)
    }

    pub fn exists(&self, rel: impl AsRef<Path>) -> bool {
        self.path(rel).exists()
    }

    /// Write a file, creating parent directories.
    pub fn with_file(self, rel: impl AsRef<Path>, contents: &str) -> Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create fixture dirs");
        }
        std::fs::write(&path, contents).expect("failed to write fixture file");
        self
    }

    pub fn with_interface(self) -> Self {
        self.with_file(
            "src/signer.i",
            "%module CardanoSigner\n%{\n#include \"signer.h\"\n%}\n%include \"signer.h\"\n",
        )
    }

    /// Put a static library in the native build-output directory.
    pub fn with_native_library(self, file_name: &str) -> Self {
        self.with_file(Path::new("target/debug").join(file_name), "!<arch>\n")
    }

    pub fn with_bridge_headers(self) -> Self {
        self.with_file("target/cxxbridge/signer/src/lib.rs.h", "#pragma once\n")
            .with_file("target/cxxbridge/rust/cxx.h", "#pragma once\n")
    }

    /// Files the binding generator would have produced.
    pub fn with_binding_outputs(self) -> Self {
        self.with_file("src/signer_wrap.cxx", "// wrapper\n")
            .with_file("src/CardanoSigner.py", "# module\n")
    }

    pub fn with_extension_sources(self) -> Self {
        self.with_file(
            "src/signer.cpp",
            "#include \"lib.rs.h\"\nint sign() { return 0; }\n",
        )
    }

    /// Context over this project with default configuration on Linux.
    pub fn context(&self) -> GlobalContext {
        self.context_with(Config::default(), Os::Linux)
    }

    pub fn context_with(&self, config: Config, os: Os) -> GlobalContext {
        GlobalContext::with_config(self.root().to_path_buf(), config)
            .with_platform(PlatformProfile::new(os))
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        ProjectFixture::new()
    }
}

/// Pattern matching the compile step of `check` run by `compiler`.
pub fn compile_pattern(compiler: &str, check: CapabilityCheck) -> CommandPattern {
    CommandPattern::Regex(format!(
        r"^{} .*{}\.cpp$",
        regex::escape(compiler),
        check.slug()
    ))
}

/// Pattern matching the execution of the program `check` built with `compiler`.
pub fn run_pattern(compiler: &str, check: CapabilityCheck) -> CommandPattern {
    CommandPattern::Regex(format!(
        r"extforge-probe-{}-[^/\\]*[/\\]{}-bin(\.exe)?$",
        regex::escape(&scratch_tag(compiler)),
        check.slug()
    ))
}

/// Script every probe step of `compiler` to succeed, except the compile
/// step of each check in `failing`.
///
/// Expectations added earlier take precedence, so tests can override
/// individual steps before calling this.
pub fn script_compiler(exec: &mut MockExecutor, compiler: &str, failing: &[CapabilityCheck]) {
    use CapabilityCheck::*;

    exec.add_tool(compiler);

    let family = CompilerFamily::infer(compiler);
    if family == CompilerFamily::Msvc {
        exec.expect(compiler, compiler_outputs::msvc_banner("19.38.33130"));
    } else {
        exec.expect(
            &format!("{} --version", compiler),
            MockProcessOutput::success(format!("{} (mock) 12.2.0\n", compiler)),
        );
    }

    let outcome = |check: CapabilityCheck| {
        if failing.contains(&check) {
            compiler_outputs::compile_error("scripted failure")
        } else {
            compiler_outputs::compile_success()
        }
    };

    exec.expect(&format!("{} -fPIC --help", compiler), outcome(Pic));

    for check in [Baseline, Headers, Interop, Threading] {
        exec.expect_pattern(CommandExpectation::new(
            compile_pattern(compiler, check),
            outcome(check),
        ));
        exec.expect_pattern(CommandExpectation::new(
            run_pattern(compiler, check),
            compiler_outputs::compile_success(),
        ));
    }
}

/// Common tool outputs for mocking.
pub mod compiler_outputs {
    use super::MockProcessOutput;

    /// `g++ --version` output.
    pub fn gcc_version(version: &str) -> MockProcessOutput {
        MockProcessOutput::success(format!(
            "g++ (GCC) {}\nCopyright (C) 2022 Free Software Foundation, Inc.\n",
            version
        ))
    }

    /// `clang++ --version` output.
    pub fn clang_version(version: &str) -> MockProcessOutput {
        MockProcessOutput::success(format!(
            "clang version {}\nTarget: x86_64-pc-linux-gnu\nThread model: posix\n",
            version
        ))
    }

    /// Banner `cl` prints (to stderr, with a usage error) when run bare.
    pub fn msvc_banner(version: &str) -> MockProcessOutput {
        MockProcessOutput::with_output(
            2,
            "",
            format!(
                "Microsoft (R) C/C++ Optimizing Compiler Version {} for x64\n\
                 Copyright (C) Microsoft Corporation.  All rights reserved.\n\n\
                 usage: cl [ option... ] filename... [ /link linkoption... ]\n",
                version
            ),
        )
    }

    /// `swig -version` output.
    pub fn swig_version(version: &str) -> MockProcessOutput {
        MockProcessOutput::success(format!(
            "\nSWIG Version {}\n\nCompiled with g++ [x86_64-pc-linux-gnu]\n",
            version
        ))
    }

    /// `cargo --version` output.
    pub fn cargo_version(version: &str) -> MockProcessOutput {
        MockProcessOutput::success(format!("cargo {} (66221abde 2024-11-19)\n", version))
    }

    /// Successful compile or run with no output.
    pub fn compile_success() -> MockProcessOutput {
        MockProcessOutput::success("")
    }

    /// Failed compilation.
    pub fn compile_error(message: &str) -> MockProcessOutput {
        MockProcessOutput::failure(1, format!("error: {}", message))
    }
}
