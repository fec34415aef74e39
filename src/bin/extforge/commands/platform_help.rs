//! `extforge show-platform-help` command

use anyhow::Result;

use extforge::util::diagnostic::DiagnosticReporter;

pub fn execute() -> Result<()> {
    print!("{}", DiagnosticReporter::platform_help());
    Ok(())
}
