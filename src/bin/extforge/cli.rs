//! CLI definitions using clap.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use extforge::util::shell::{ColorChoice, Shell};
use extforge::GlobalContext;

/// extforge - build a native extension module from a Rust static library
#[derive(Parser)]
#[command(name = "extforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Run as if started in DIR
    #[arg(
        short = 'C',
        long = "project-dir",
        global = true,
        value_name = "DIR",
        env = "EXTFORGE_PROJECT_DIR"
    )]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn shell(&self, json: bool) -> Shell {
        Shell::from_flags(self.quiet, self.verbose, self.color).json(json)
    }

    pub fn context(&self) -> Result<GlobalContext> {
        GlobalContext::new(self.project_dir.as_deref())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check for cargo, swig and a capable C++ compiler
    CheckPrerequisites(CheckArgs),

    /// Print installation instructions for every platform
    ShowPlatformHelp,

    /// Regenerate language bindings from the interface file
    GenerateBindings,

    /// Build the native library and the extension module
    Build(BuildArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// Also require the binding generator (packaging mode)
    #[arg(long)]
    pub packaging: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Use the pre-generated binding files (default)
    #[arg(long, conflicts_with = "package")]
    pub install: bool,

    /// Regenerate bindings before compiling
    #[arg(long)]
    pub package: bool,

    /// Where to put the library, headers and extension module
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print pipeline events as JSON lines
    #[arg(long)]
    pub json: bool,
}
