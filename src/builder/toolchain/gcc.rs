//! GCC/Clang-style compiler driver.
//!
//! Also used for Intel and unknown `cc`/`c++` compilers, which accept the
//! same basic flags.

use std::path::Path;

use crate::util::process::ProcessBuilder;

use super::{CompilerDriver, CompilerFamily, ModuleInput, ProgramOptions};

/// Driver for compilers with GCC-compatible command lines.
#[derive(Debug, Clone)]
pub struct GccDriver {
    command: String,
    family: CompilerFamily,
}

impl GccDriver {
    pub fn new(command: impl Into<String>, family: CompilerFamily) -> Self {
        GccDriver {
            command: command.into(),
            family,
        }
    }
}

impl CompilerDriver for GccDriver {
    fn command(&self) -> &str {
        &self.command
    }

    fn family(&self) -> CompilerFamily {
        self.family
    }

    fn version_command(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.command).arg("--version")
    }

    fn executable_command(
        &self,
        source: &Path,
        output: &Path,
        opts: ProgramOptions,
    ) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.command);

        if opts.cxx11 {
            cmd = cmd.arg("-std=c++11");
        }
        if opts.threads {
            cmd = cmd.arg("-pthread");
        }

        // Source last, so the command line reads the same on every family
        cmd.arg("-o").arg(output).arg(source)
    }

    fn pic_probe_command(&self) -> Option<ProcessBuilder> {
        Some(ProcessBuilder::new(&self.command).args(["-fPIC", "--help"]))
    }

    fn shared_module_command(&self, input: &ModuleInput) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.command).args(["-std=c++11", "-shared", "-fPIC"]);

        for dir in &input.include_dirs {
            cmd = cmd.arg(format!("-I{}", dir.display()));
        }

        cmd = cmd.arg("-o").arg(&input.output);

        for source in &input.sources {
            cmd = cmd.arg(source);
        }

        // Libraries after the sources that reference them
        for object in &input.objects {
            cmd = cmd.arg(object);
        }

        if self.family.is_gnu_like() {
            cmd = cmd.arg("-pthread");
        }

        cmd.args(input.extra_args.iter())
    }
}
