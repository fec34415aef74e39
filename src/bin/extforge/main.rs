//! extforge CLI - orchestrates native extension builds

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging; EXTFORGE_LOG overrides the flag-derived level
    let default_filter = if cli.verbose {
        "extforge=debug"
    } else if cli.quiet {
        "extforge=error"
    } else {
        "extforge=info"
    };
    let filter = EnvFilter::try_from_env("EXTFORGE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    // Execute command
    match &cli.command {
        Commands::CheckPrerequisites(args) => commands::check::execute(args, &cli),
        Commands::ShowPlatformHelp => commands::platform_help::execute(),
        Commands::GenerateBindings => commands::generate::execute(&cli),
        Commands::Build(args) => commands::build::execute(args, &cli),
    }
}
