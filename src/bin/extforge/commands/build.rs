//! `extforge build` command

use std::time::Instant;

use anyhow::Result;

use super::display_path;
use crate::cli::{BuildArgs, Cli};
use extforge::core::{BuildMode, BuildStage};
use extforge::ops::{BuildPipeline, PipelineError, PipelineEvent, PipelineStep};
use extforge::util::diagnostic::{emit, DiagnosticReporter};
use extforge::util::shell::{format_duration, Shell, Status, Step};
use extforge::util::SystemExecutor;
use extforge::GlobalContext;

pub fn execute(args: &BuildArgs, cli: &Cli) -> Result<()> {
    let shell = cli.shell(args.json);
    let mut ctx = cli.context()?;
    if let Some(dir) = &args.output_dir {
        ctx = ctx.with_output_dir(dir.clone());
    }

    let mode = if args.package {
        BuildMode::Package
    } else {
        BuildMode::Install
    };

    let start = Instant::now();
    let exec = SystemExecutor;
    let mut step: Option<Step> = None;

    let result = BuildPipeline::new(&exec, &ctx, mode).run(&mut |event| {
        // Clear any spinner before printing.
        step.take();
        if args.json {
            if let Ok(line) = serde_json::to_string(&event) {
                println!("{}", line);
            }
        } else {
            step = render(&shell, &ctx, event);
        }
    });
    step.take();

    match result {
        Ok(output) => {
            shell.status(
                Status::Finished,
                format!(
                    "{} in {}",
                    display_path(&ctx, &output.module),
                    format_duration(start.elapsed())
                ),
            );
            Ok(())
        }
        Err(err) => {
            let reporter = DiagnosticReporter::new(ctx.platform().os);
            if let PipelineError::MissingTools { missing, .. } = &err {
                eprint!("{}", reporter.missing_tools(missing));
            }
            emit(&reporter.failure(err.class(), &err.detail()), shell.use_color());
            std::process::exit(1);
        }
    }
}

/// Print one event; returns a spinner for steps that just started.
fn render(shell: &Shell, ctx: &GlobalContext, event: PipelineEvent) -> Option<Step> {
    match event {
        PipelineEvent::Started { mode, platform } => {
            shell.status(Status::Building, format!("extension ({} mode, {})", mode, platform));
        }
        PipelineEvent::StepStarted { step } => {
            let (status, message) = match step {
                PipelineStep::CheckToolchain => (Status::Checking, "build prerequisites".to_string()),
                PipelineStep::BuildNative => (
                    Status::Building,
                    format!("native library (`{}`)", ctx.config().native.command),
                ),
                PipelineStep::CopyArtifacts => (
                    Status::Copying,
                    format!("artifacts to {}", display_path(ctx, &ctx.output_dir())),
                ),
                PipelineStep::GenerateBindings => (
                    Status::Generating,
                    format!("bindings from {}", display_path(ctx, &ctx.interface_file())),
                ),
                PipelineStep::VerifyBindings => {
                    (Status::Checking, "pre-generated bindings".to_string())
                }
                PipelineStep::CompileExtension => {
                    (Status::Compiling, ctx.config().extension.module.clone())
                }
            };
            return Some(shell.step(status, message));
        }
        PipelineEvent::ToolchainSelected {
            name,
            version,
            command,
        } => {
            shell.status(Status::Verified, format!("{} {} (`{}`)", name, version, command));
        }
        PipelineEvent::StageReached { stage } => {
            if shell.is_verbose() && stage != BuildStage::Completed {
                shell.status(Status::Finished, stage);
            }
        }
        PipelineEvent::ArtifactCopied { path } => {
            if shell.is_verbose() {
                shell.status(Status::Copying, display_path(ctx, &path));
            }
        }
        PipelineEvent::BindingsReady { files } => {
            for file in files {
                shell.status(Status::Verified, display_path(ctx, &file));
            }
        }
        PipelineEvent::Warning { message } => shell.warn(message),
        PipelineEvent::Finished { .. } => {}
    }
    None
}
