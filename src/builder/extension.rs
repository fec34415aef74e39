//! Final extension module compile.
//!
//! Links the generated wrapper sources and the copied static library into a
//! shared module (`<module>.so`, or `<module>.pyd` on Windows) inside the
//! output directory.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

use crate::builder::artifact::extension_file_name;
use crate::builder::toolchain::{CompilerDriver, ModuleInput};
use crate::util::context::GlobalContext;
use crate::util::fs::glob_files;
use crate::util::process::{Executor, ProcessError};

#[derive(Debug, Error, Diagnostic)]
pub enum ExtensionError {
    #[error("no source files match {}", .patterns.join(", "))]
    #[diagnostic(
        code(extforge::extension::no_sources),
        help("check `[extension] sources` and that bindings were generated")
    )]
    MissingSources { patterns: Vec<String> },

    #[error("invalid source pattern: {message}")]
    #[diagnostic(code(extforge::extension::pattern))]
    Pattern { message: String },

    #[error("extension compile failed")]
    #[diagnostic(code(extforge::extension::compile_failed))]
    Compile(#[from] ProcessError),
}

/// Builds the extension module with a probed compiler.
pub struct ExtensionBuild<'a> {
    exec: &'a dyn Executor,
    ctx: &'a GlobalContext,
    driver: &'a dyn CompilerDriver,
}

impl<'a> ExtensionBuild<'a> {
    pub fn new(exec: &'a dyn Executor, ctx: &'a GlobalContext, driver: &'a dyn CompilerDriver) -> Self {
        ExtensionBuild { exec, ctx, driver }
    }

    /// Where the module will be written.
    pub fn output_path(&self) -> PathBuf {
        let module = &self.ctx.config().extension.module;
        self.ctx
            .output_dir()
            .join(extension_file_name(self.ctx.platform(), module))
    }

    /// Collect sources, include directories and the library to link.
    ///
    /// Every configured source pattern must match at least one file.
    pub fn module_input(&self, library: &Path) -> Result<ModuleInput, ExtensionError> {
        let extension = &self.ctx.config().extension;

        let (sources, unmatched) = glob_files(self.ctx.project_root(), &extension.sources)
            .map_err(|e| ExtensionError::Pattern {
                message: format!("{:#}", e),
            })?;
        if !unmatched.is_empty() {
            return Err(ExtensionError::MissingSources {
                patterns: unmatched,
            });
        }

        // Copied headers live in the output directory.
        let mut include_dirs = vec![self.ctx.output_dir()];
        for dir in &extension.include_dirs {
            let dir = self.ctx.resolve(dir);
            if !include_dirs.contains(&dir) {
                include_dirs.push(dir);
            }
        }

        Ok(ModuleInput {
            sources,
            objects: vec![library.to_path_buf()],
            include_dirs,
            extra_args: extension.extra_args.clone(),
            output: self.output_path(),
        })
    }

    /// Compile and link the module, linking exactly `library`.
    pub fn run(&self, library: &Path) -> Result<PathBuf, ExtensionError> {
        let input = self.module_input(library)?;
        let cmd = self
            .driver
            .shared_module_command(&input)
            .cwd(self.ctx.project_root())
            .timeout(self.ctx.config().extension.timeout());

        tracing::info!("compiling extension: {}", cmd.display_command());
        ProcessError::check(self.exec, &cmd)?;
        Ok(input.output)
    }
}
