//! `extforge check-prerequisites` command

use anyhow::Result;

use crate::cli::{CheckArgs, Cli};
use extforge::core::BuildMode;
use extforge::ops::{check_prerequisites, format_report, naming_notice};
use extforge::util::diagnostic::{emit, Diagnostic, DiagnosticReporter};
use extforge::util::shell::Status;
use extforge::util::SystemExecutor;

pub fn execute(args: &CheckArgs, cli: &Cli) -> Result<()> {
    let shell = cli.shell(args.json);
    let ctx = cli.context()?;
    let mode = BuildMode::from_packaging(args.packaging);

    let exec = SystemExecutor;
    let report = {
        let _step = shell.step(Status::Checking, format!("build prerequisites ({} mode)", mode));
        check_prerequisites(&exec, &ctx, mode)
    };

    if args.json {
        shell.print_json(&report)?;
    } else if !shell.is_quiet() {
        print!("{}", format_report(&report, shell.is_verbose()));
        if let Some(notice) = naming_notice(&exec, &ctx) {
            let diag = Diagnostic::warning("static library naming is ambiguous")
                .with_context(notice)
                .with_suggestion(
                    "add `[library] naming = \"msvc\"` or `\"mingw\"` to .extforge/config.toml",
                );
            emit(&diag, shell.use_color());
        }
    }

    // Exit with error code if a required tool is missing
    if !report.is_satisfied() {
        if !args.json {
            eprint!(
                "{}",
                DiagnosticReporter::new(ctx.platform().os).missing_tools(&report.missing)
            );
        }
        std::process::exit(1);
    }

    shell.status(Status::Finished, "all required tools are available");
    Ok(())
}
