//! `extforge generate-bindings` command

use anyhow::Result;

use super::{display_path, error_chain};
use crate::cli::Cli;
use extforge::builder::BindingGenerator;
use extforge::core::{BuildMode, FailureClass};
use extforge::ops::check_prerequisites;
use extforge::util::diagnostic::{emit, DiagnosticReporter};
use extforge::util::shell::{format_duration, Status};
use extforge::util::SystemExecutor;

pub fn execute(cli: &Cli) -> Result<()> {
    let shell = cli.shell(false);
    let ctx = cli.context()?;

    let exec = SystemExecutor;
    let reporter = DiagnosticReporter::new(ctx.platform().os);

    let report = {
        let _step = shell.step(Status::Checking, "build prerequisites (package mode)");
        check_prerequisites(&exec, &ctx, BuildMode::Package)
    };
    if !report.is_satisfied() {
        eprint!("{}", reporter.missing_tools(&report.missing));
        std::process::exit(1);
    }

    let generator = BindingGenerator::new(&exec, &ctx);

    let step = shell.step(
        Status::Generating,
        format!("bindings from {}", display_path(&ctx, &ctx.interface_file())),
    );
    let result = generator.generate();
    let elapsed = step.finish();

    match result {
        Ok(report) => {
            for path in &report.present {
                shell.status(Status::Verified, display_path(&ctx, path));
            }
            for path in &report.missing {
                shell.warn(format!("{} was not generated", display_path(&ctx, path)));
            }
            shell.status(
                Status::Finished,
                format!("bindings in {}", format_duration(elapsed)),
            );
            Ok(())
        }
        Err(err) => {
            let diag = reporter.failure(FailureClass::Bindings, &error_chain(&err));
            emit(&diag, shell.use_color());
            std::process::exit(1);
        }
    }
}
