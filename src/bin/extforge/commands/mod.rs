//! Command implementations

pub mod build;
pub mod check;
pub mod generate;
pub mod platform_help;

use std::path::Path;

use extforge::util::fs::relative_path;
use extforge::GlobalContext;

/// A path shown relative to the project root when it lies inside it.
fn display_path(ctx: &GlobalContext, path: &Path) -> String {
    let rel = relative_path(ctx.project_root(), path);
    if rel.starts_with("..") {
        path.display().to_string()
    } else {
        rel.display().to_string()
    }
}

/// An error and its sources, one per line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut lines = vec![err.to_string()];
    let mut source = err.source();
    while let Some(e) = source {
        lines.push(e.to_string());
        source = e.source();
    }
    lines.join("\n")
}
