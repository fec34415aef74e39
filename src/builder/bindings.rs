//! Interface binding generation.
//!
//! Packaging runs the external generator (SWIG by default) over the
//! interface file. Installation never runs it and only checks that the
//! generated files shipped with the source are present.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::util::context::GlobalContext;
use crate::util::process::{Executor, ProcessBuilder, ProcessError};

/// Errors from generating or verifying bindings.
#[derive(Debug, Error, Diagnostic)]
pub enum BindingError {
    #[error("interface file not found: {}", path.display())]
    #[diagnostic(
        code(extforge::bindings::missing_interface),
        help("the interface file describes the API to wrap; check `[bindings] interface`")
    )]
    MissingInterface { path: PathBuf },

    #[error("binding generation failed")]
    #[diagnostic(code(extforge::bindings::generator_failed))]
    Generator(#[from] ProcessError),

    #[error("binding files missing: {}", list(.missing))]
    #[diagnostic(
        code(extforge::bindings::outputs_missing),
        help("run `extforge generate-bindings` first")
    )]
    OutputsMissing { missing: Vec<PathBuf> },
}

fn list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Which expected binding files exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingReport {
    pub present: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
}

impl BindingReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Runs or verifies the binding generator for one project.
pub struct BindingGenerator<'a> {
    exec: &'a dyn Executor,
    ctx: &'a GlobalContext,
}

impl<'a> BindingGenerator<'a> {
    pub fn new(exec: &'a dyn Executor, ctx: &'a GlobalContext) -> Self {
        BindingGenerator { exec, ctx }
    }

    /// The generator invocation, run from the project root.
    pub fn command(&self) -> ProcessBuilder {
        let config = &self.ctx.config().bindings;
        ProcessBuilder::new(&config.generator)
            .args(config.args.iter())
            .arg(&config.interface)
            .cwd(self.ctx.project_root())
            .timeout(config.timeout())
    }

    /// Run the generator, then check its outputs.
    ///
    /// Missing outputs after a successful run are reported, not errors.
    pub fn generate(&self) -> Result<BindingReport, BindingError> {
        let interface = self.ctx.interface_file();
        if !interface.is_file() {
            return Err(BindingError::MissingInterface { path: interface });
        }

        let cmd = self.command();
        tracing::info!("generating bindings: {}", cmd.display_command());
        ProcessError::check(self.exec, &cmd)?;

        let report = self.check_outputs();
        for path in &report.missing {
            tracing::warn!("{} was not generated", path.display());
        }
        Ok(report)
    }

    /// Require every expected output to exist already.
    pub fn verify(&self) -> Result<BindingReport, BindingError> {
        let report = self.check_outputs();
        if report.is_complete() {
            Ok(report)
        } else {
            Err(BindingError::OutputsMissing {
                missing: report.missing,
            })
        }
    }

    /// Which expected outputs exist, without running anything.
    pub fn check_outputs(&self) -> BindingReport {
        let (present, missing): (Vec<PathBuf>, Vec<PathBuf>) = self
            .ctx
            .binding_outputs()
            .into_iter()
            .partition(|p| p.is_file());
        BindingReport { present, missing }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockExecutor, MockProcessOutput, ProjectFixture};

    #[test]
    fn test_command_shape() {
        let project = ProjectFixture::new();
        let ctx = project.context();
        let exec = MockExecutor::new();

        let cmd = BindingGenerator::new(&exec, &ctx).command();
        assert_eq!(cmd.display_command(), "swig -c++ -python src/signer.i");
        assert_eq!(cmd.get_cwd(), Some(project.root()));
    }

    #[test]
    fn test_missing_interface_never_runs_generator() {
        let project = ProjectFixture::new();
        let ctx = project.context();
        let exec = MockExecutor::new();

        let err = BindingGenerator::new(&exec, &ctx).generate().unwrap_err();
        assert!(matches!(err, BindingError::MissingInterface { .. }));
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn test_generator_failure_is_error() {
        let project = ProjectFixture::new().with_interface();
        let ctx = project.context();
        let mut exec = MockExecutor::new();
        exec.expect_prefix("swig", MockProcessOutput::failure(1, "signer.i:3: Syntax error"));

        let err = BindingGenerator::new(&exec, &ctx).generate().unwrap_err();
        match err {
            BindingError::Generator(ProcessError::Failed { code, stderr, .. }) => {
                assert_eq!(code, Some(1));
                assert!(stderr.contains("Syntax error"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_generator_timeout_is_error() {
        let project = ProjectFixture::new().with_interface();
        let ctx = project.context();
        let mut exec = MockExecutor::new();
        exec.expect_prefix("swig", MockProcessOutput::timeout());

        let err = BindingGenerator::new(&exec, &ctx).generate().unwrap_err();
        assert!(matches!(
            err,
            BindingError::Generator(ProcessError::TimedOut { secs: 120, .. })
        ));
    }

    #[test]
    fn test_missing_output_after_success_is_soft() {
        let project = ProjectFixture::new()
            .with_interface()
            .with_file("src/signer_wrap.cxx", "// wrapper\n");
        let ctx = project.context();
        let mut exec = MockExecutor::new();
        exec.expect_prefix("swig", MockProcessOutput::success(""));

        let report = BindingGenerator::new(&exec, &ctx).generate().unwrap();
        assert_eq!(report.present, vec![project.path("src/signer_wrap.cxx")]);
        assert_eq!(report.missing, vec![project.path("src/CardanoSigner.py")]);
    }

    #[test]
    fn test_verify_names_every_missing_file() {
        let project = ProjectFixture::new();
        let ctx = project.context();
        let exec = MockExecutor::new();

        let err = BindingGenerator::new(&exec, &ctx).verify().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("signer_wrap.cxx"));
        assert!(message.contains("CardanoSigner.py"));
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn test_verify_passes_with_outputs() {
        let project = ProjectFixture::new().with_binding_outputs();
        let ctx = project.context();
        let exec = MockExecutor::new();

        let report = BindingGenerator::new(&exec, &ctx).verify().unwrap();
        assert!(report.is_complete());
        assert_eq!(report.present.len(), 2);
    }
}
