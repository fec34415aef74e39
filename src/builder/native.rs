//! Native static library build.
//!
//! Runs the configured build tool (`cargo build` by default) from the
//! project root. The tool itself decides what to rebuild.

use crate::util::context::GlobalContext;
use crate::util::process::{Executor, ProcessBuilder, ProcessError};

/// The native library build step.
pub struct NativeBuild<'a> {
    exec: &'a dyn Executor,
    ctx: &'a GlobalContext,
}

impl<'a> NativeBuild<'a> {
    pub fn new(exec: &'a dyn Executor, ctx: &'a GlobalContext) -> Self {
        NativeBuild { exec, ctx }
    }

    pub fn command(&self) -> ProcessBuilder {
        let native = &self.ctx.config().native;
        ProcessBuilder::new(&native.command)
            .args(native.args.iter())
            .cwd(self.ctx.project_root())
            .timeout(native.timeout())
    }

    /// Run the build. A non-zero exit or timeout is an error.
    pub fn run(&self) -> Result<(), ProcessError> {
        let cmd = self.command();
        tracing::info!("building native library: {}", cmd.display_command());

        let output = ProcessError::check(self.exec, &cmd)?;
        if !output.stderr.is_empty() {
            tracing::debug!("{}", output.stderr.trim_end());
        }
        Ok(())
    }
}
