//! The build pipeline.
//!
//! One fixed sequence, gated by the prerequisite check:
//!
//! ```text
//! NotStarted -> ToolchainVerified -> NativeLibraryBuilt -> ArtifactsCopied
//!            -> BindingsReady -> Completed
//! ```
//!
//! The first failure moves the run to `Failed` and nothing after it runs.
//! Progress is reported to an observer as [`PipelineEvent`]s.

use std::path::PathBuf;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::builder::artifact::{
    copy_artifacts, expected_library_name, naming_is_ambiguous, ArtifactError,
};
use crate::builder::bindings::{BindingError, BindingGenerator};
use crate::builder::extension::{ExtensionBuild, ExtensionError};
use crate::builder::native::NativeBuild;
use crate::builder::toolchain::ToolchainInfo;
use crate::core::{BuildMode, BuildStage, FailureClass, MissingTool, PlatformProfile};
use crate::ops::prerequisites::check_prerequisites;
use crate::util::config::LibraryNaming;
use crate::util::context::GlobalContext;
use crate::util::process::{Executor, ProcessError};

/// A long-running step, announced before it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStep {
    CheckToolchain,
    BuildNative,
    CopyArtifacts,
    GenerateBindings,
    VerifyBindings,
    CompileExtension,
}

/// Progress reported while the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum PipelineEvent {
    Started {
        mode: BuildMode,
        platform: PlatformProfile,
    },
    StepStarted {
        step: PipelineStep,
    },
    ToolchainSelected {
        name: String,
        version: String,
        command: String,
    },
    StageReached {
        stage: BuildStage,
    },
    ArtifactCopied {
        path: PathBuf,
    },
    BindingsReady {
        files: Vec<PathBuf>,
    },
    Warning {
        message: String,
    },
    Finished {
        module: PathBuf,
    },
}

/// Errors that end a pipeline run.
#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error("missing required build tools: {}", tool_list(.missing))]
    #[diagnostic(
        code(extforge::pipeline::missing_toolchain),
        help("run `extforge check-prerequisites` for install instructions")
    )]
    MissingTools {
        missing: Vec<MissingTool>,
        /// Critical compiler failures, when a compiler was found
        details: Vec<String>,
    },

    #[error("native library build failed")]
    #[diagnostic(code(extforge::pipeline::native_build))]
    NativeBuild(#[source] ProcessError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Artifacts(#[from] ArtifactError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Bindings(#[from] BindingError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Extension(#[from] ExtensionError),
}

fn tool_list(tools: &[MissingTool]) -> String {
    tools
        .iter()
        .map(|t| t.id())
        .collect::<Vec<_>>()
        .join(", ")
}

impl PipelineError {
    pub fn class(&self) -> FailureClass {
        match self {
            PipelineError::MissingTools { .. } => FailureClass::MissingToolchain,
            PipelineError::NativeBuild(_) => FailureClass::NativeBuild,
            PipelineError::Artifacts(_) => FailureClass::Artifacts,
            PipelineError::Bindings(_) => FailureClass::Bindings,
            PipelineError::Extension(_) => FailureClass::ExtensionCompile,
        }
    }

    /// The error and its sources, one per line, for remediation output.
    pub fn detail(&self) -> String {
        let mut lines = vec![self.to_string()];
        if let PipelineError::MissingTools { details, .. } = self {
            lines.extend(details.iter().cloned());
        }
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            lines.push(err.to_string());
            source = err.source();
        }
        lines.join("\n")
    }
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub toolchain: ToolchainInfo,
    /// Static library in the output directory
    pub library: PathBuf,
    pub headers: Vec<PathBuf>,
    pub bindings: Vec<PathBuf>,
    /// The extension module
    pub module: PathBuf,
}

/// One run of the build pipeline.
pub struct BuildPipeline<'a> {
    exec: &'a dyn Executor,
    ctx: &'a GlobalContext,
    mode: BuildMode,
    stage: BuildStage,
}

impl<'a> BuildPipeline<'a> {
    pub fn new(exec: &'a dyn Executor, ctx: &'a GlobalContext, mode: BuildMode) -> Self {
        BuildPipeline {
            exec,
            ctx,
            mode,
            stage: BuildStage::NotStarted,
        }
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn stage(&self) -> &BuildStage {
        &self.stage
    }

    /// Run every stage in order, stopping at the first failure.
    pub fn run(
        mut self,
        observer: &mut dyn FnMut(PipelineEvent),
    ) -> Result<PipelineOutput, PipelineError> {
        observer(PipelineEvent::Started {
            mode: self.mode,
            platform: self.ctx.platform(),
        });

        match self.run_stages(observer) {
            Ok(output) => Ok(output),
            Err(err) => {
                tracing::debug!("pipeline failed: {}", err.detail());
                self.advance(err.class().stage(), observer);
                Err(err)
            }
        }
    }

    fn run_stages(
        &mut self,
        observer: &mut dyn FnMut(PipelineEvent),
    ) -> Result<PipelineOutput, PipelineError> {
        // Gate
        observer(PipelineEvent::StepStarted {
            step: PipelineStep::CheckToolchain,
        });
        let report = check_prerequisites(self.exec, self.ctx, self.mode);
        let toolchain = report.toolchain;
        if !report.missing.is_empty() {
            return Err(PipelineError::MissingTools {
                missing: report.missing,
                details: toolchain.critical_failures,
            });
        }
        let driver = toolchain.driver().ok_or_else(|| PipelineError::MissingTools {
            missing: vec![MissingTool::CxxCompiler],
            details: Vec::new(),
        })?;

        observer(PipelineEvent::ToolchainSelected {
            name: toolchain.name.clone(),
            version: toolchain.version.clone(),
            command: toolchain.command.clone(),
        });
        for warning in &toolchain.warnings {
            warn(observer, format!("{}: {}", toolchain.command, warning));
        }
        if let Some(notice) = naming_notice(self.exec, self.ctx) {
            warn(observer, notice);
        }
        self.advance(BuildStage::ToolchainVerified, observer);

        observer(PipelineEvent::StepStarted {
            step: PipelineStep::BuildNative,
        });
        NativeBuild::new(self.exec, self.ctx)
            .run()
            .map_err(PipelineError::NativeBuild)?;
        self.advance(BuildStage::NativeLibraryBuilt, observer);

        observer(PipelineEvent::StepStarted {
            step: PipelineStep::CopyArtifacts,
        });
        let copied = copy_artifacts(self.ctx)?;
        observer(PipelineEvent::ArtifactCopied {
            path: copied.library.clone(),
        });
        for header in &copied.headers {
            observer(PipelineEvent::ArtifactCopied {
                path: header.clone(),
            });
        }
        for header in &copied.missing_headers {
            warn(observer, format!("bridge header {} not found", header.display()));
        }
        self.advance(BuildStage::ArtifactsCopied, observer);

        let generator = BindingGenerator::new(self.exec, self.ctx);
        let bindings = if self.mode.is_packaging() {
            observer(PipelineEvent::StepStarted {
                step: PipelineStep::GenerateBindings,
            });
            let report = generator.generate()?;
            for path in &report.missing {
                warn(observer, format!("{} was not generated", path.display()));
            }
            report.present
        } else {
            observer(PipelineEvent::StepStarted {
                step: PipelineStep::VerifyBindings,
            });
            generator.verify()?.present
        };
        observer(PipelineEvent::BindingsReady {
            files: bindings.clone(),
        });
        self.advance(BuildStage::BindingsReady, observer);

        observer(PipelineEvent::StepStarted {
            step: PipelineStep::CompileExtension,
        });
        let module = ExtensionBuild::new(self.exec, self.ctx, &*driver).run(&copied.library)?;
        self.advance(BuildStage::Completed, observer);
        observer(PipelineEvent::Finished {
            module: module.clone(),
        });

        Ok(PipelineOutput {
            toolchain,
            library: copied.library,
            headers: copied.headers,
            bindings,
            module,
        })
    }

    fn advance(&mut self, next: BuildStage, observer: &mut dyn FnMut(PipelineEvent)) {
        debug_assert!(
            self.stage.can_advance_to(&next),
            "invalid transition {} -> {}",
            self.stage,
            next
        );
        tracing::info!("{} -> {}", self.stage, next);
        self.stage = next.clone();
        observer(PipelineEvent::StageReached { stage: next });
    }
}

fn warn(observer: &mut dyn FnMut(PipelineEvent), message: String) {
    tracing::warn!("{}", message);
    observer(PipelineEvent::Warning { message });
}

/// Warn when `auto` naming runs where both MSVC and MinGW compilers exist.
pub fn naming_notice(exec: &dyn Executor, ctx: &GlobalContext) -> Option<String> {
    let library = &ctx.config().library;
    if library.naming != LibraryNaming::Auto || !naming_is_ambiguous(ctx.platform(), exec) {
        return None;
    }
    let guess = expected_library_name(ctx.platform(), &library.name, exec);
    Some(format!(
        "both MSVC (cl) and MinGW (gcc) are on PATH; the compiler heuristic expects {} but the \
         build links the first of {}.lib, lib{}.a, lib{}.lib the native build produced. \
         Set `[library] naming` to \"msvc\" or \"mingw\" to choose",
        guess, library.name, library.name, library.name
    ))
}
