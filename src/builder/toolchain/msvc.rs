//! MSVC compiler driver (Windows).

use std::path::Path;

use crate::util::process::ProcessBuilder;

use super::{CompilerDriver, CompilerFamily, ModuleInput, ProgramOptions};

/// Driver for `cl.exe`.
///
/// `cl` has no C++11 switch; `/std:c++14` is the oldest dialect it accepts.
#[derive(Debug, Clone)]
pub struct MsvcDriver {
    command: String,
}

impl MsvcDriver {
    pub fn new(command: impl Into<String>) -> Self {
        MsvcDriver {
            command: command.into(),
        }
    }
}

impl CompilerDriver for MsvcDriver {
    fn command(&self) -> &str {
        &self.command
    }

    fn family(&self) -> CompilerFamily {
        CompilerFamily::Msvc
    }

    /// `cl` prints its banner to stderr when run without arguments.
    fn version_command(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.command)
    }

    fn executable_command(
        &self,
        source: &Path,
        output: &Path,
        opts: ProgramOptions,
    ) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.command).arg("/nologo");

        if opts.cxx11 {
            cmd = cmd.arg("/std:c++14");
        }

        // Threads need no flag: the CRT is always multithreaded.
        cmd.arg("/EHsc")
            .arg(format!("/Fe:{}", output.display()))
            .arg(source)
    }

    fn pic_probe_command(&self) -> Option<ProcessBuilder> {
        None
    }

    fn shared_module_command(&self, input: &ModuleInput) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.command).args(["/nologo", "/std:c++14", "/EHsc", "/LD"]);

        for dir in &input.include_dirs {
            cmd = cmd.arg(format!("/I{}", dir.display()));
        }

        cmd = cmd.arg(format!("/Fe:{}", input.output.display()));

        for source in &input.sources {
            cmd = cmd.arg(source);
        }
        for object in &input.objects {
            cmd = cmd.arg(object);
        }

        cmd.args(input.extra_args.iter())
    }
}
