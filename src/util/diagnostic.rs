//! User-friendly diagnostic messages.
//!
//! Every hard failure ends with something the user can do about it: install
//! commands for missing tools, and a remediation block per failure class.
//! Output depends only on its inputs, never on the host it runs on.

use std::fmt;

use crate::core::{FailureClass, MissingTool, Os};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(message)
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

const RULE: &str =
    "======================================================================";

/// Renders remediation text for one target platform.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticReporter {
    os: Os,
}

impl DiagnosticReporter {
    pub fn new(os: Os) -> Self {
        DiagnosticReporter { os }
    }

    /// Install instructions for each missing tool, in the order given.
    ///
    /// Repeated tools are rendered once.
    pub fn missing_tools(&self, tools: &[MissingTool]) -> String {
        let mut out = String::new();
        out.push_str(RULE);
        out.push_str("\nerror: missing required build tools\n");
        out.push_str(RULE);
        out.push('\n');

        let mut seen = Vec::new();
        for tool in tools {
            if seen.contains(tool) {
                continue;
            }
            seen.push(*tool);

            out.push_str(&format!("\n{} not found\n", tool.id().to_uppercase()));
            for line in self.install_lines(*tool) {
                if line.is_empty() {
                    out.push('\n');
                } else {
                    out.push_str("   ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }

        out.push('\n');
        out.push_str(RULE);
        out.push_str("\nAfter installing the missing tools, run `extforge check-prerequisites` again.\n");
        out.push_str(RULE);
        out.push('\n');
        out
    }

    fn install_lines(&self, tool: MissingTool) -> Vec<&'static str> {
        match (tool, self.os) {
            (MissingTool::Cargo, os) => {
                let mut lines = vec!["The Rust toolchain builds the native library."];
                lines.extend(match os {
                    Os::Darwin => vec![
                        "Install with: brew install rust",
                        "Or visit: https://rustup.rs/",
                    ],
                    Os::Linux => vec![
                        "Install with: curl --proto '=https' --tlsv1.2 -sSf https://sh.rustup.rs | sh",
                        "Or use your package manager:",
                        "  - Ubuntu/Debian: sudo apt install rustc cargo",
                        "  - Fedora: sudo dnf install rust cargo",
                        "  - Arch: sudo pacman -S rust",
                    ],
                    Os::Windows => vec![
                        "Download and install from: https://rustup.rs/",
                        "Or use: winget install Rustlang.Rustup",
                    ],
                    Os::Other => vec!["Visit https://rustup.rs/ for installation instructions"],
                });
                lines
            }
            (MissingTool::Swig, os) => {
                let mut lines = vec!["SWIG generates the language bindings when packaging."];
                lines.extend(match os {
                    Os::Darwin => vec!["Install with: brew install swig"],
                    Os::Linux => vec![
                        "Install with your package manager:",
                        "  - Ubuntu/Debian: sudo apt install swig",
                        "  - Fedora: sudo dnf install swig",
                        "  - Arch: sudo pacman -S swig",
                    ],
                    Os::Windows => vec![
                        "Download from: http://www.swig.org/download.html",
                        "Or use: winget install SWIG.SWIG",
                        "Or with Chocolatey: choco install swig",
                    ],
                    Os::Other => vec!["Visit http://www.swig.org/ for installation instructions"],
                });
                lines
            }
            (MissingTool::CxxCompiler, os) => {
                let mut lines = vec![
                    "A C++11 compatible compiler is required.",
                    "Supported compilers: GCC, Clang, MSVC",
                    "",
                ];
                lines.extend(match os {
                    Os::Darwin => vec![
                        "Recommended: Xcode Command Line Tools",
                        "  xcode-select --install",
                        "Alternative: Homebrew",
                        "  brew install gcc",
                        "  brew install llvm",
                        "Verify: g++ --version or clang++ --version",
                    ],
                    Os::Linux => vec![
                        "Ubuntu/Debian:",
                        "  sudo apt update",
                        "  sudo apt install build-essential",
                        "Fedora/RHEL/CentOS:",
                        "  sudo dnf groupinstall 'Development Tools'",
                        "  sudo dnf install gcc gcc-c++ make",
                        "Arch Linux:",
                        "  sudo pacman -S base-devel",
                        "  sudo pacman -S clang",
                        "Verify: g++ --version or clang++ --version",
                    ],
                    Os::Windows => vec![
                        "Option 1: Visual Studio Community (select 'Desktop development with C++')",
                        "  https://visualstudio.microsoft.com/downloads/",
                        "Option 2: Build Tools for Visual Studio",
                        "  winget install Microsoft.VisualStudio.2022.BuildTools",
                        "Option 3: MinGW-w64 through MSYS2 (https://www.msys2.org/)",
                        "  pacman -S mingw-w64-x86_64-toolchain",
                        "  then add C:\\msys64\\mingw64\\bin to PATH",
                        "Option 4: package managers",
                        "  winget install LLVM.LLVM",
                        "  choco install mingw",
                        "Verify: cl (from a Developer Command Prompt) or g++ --version",
                    ],
                    Os::Other => vec![
                        "Install a C++11 compatible compiler for your platform.",
                        "Minimum versions: GCC 4.7, Clang 3.3, MSVC 2013",
                    ],
                });
                lines.extend([
                    "",
                    "Set CXX or `[toolchain] cxx` to use a compiler that is not on the default list.",
                ]);
                lines
            }
        }
    }

    /// Remediation for a pipeline failure.
    ///
    /// `detail` is the underlying error, shown as context.
    pub fn failure(&self, class: FailureClass, detail: &str) -> Diagnostic {
        let title = match class {
            FailureClass::MissingToolchain => "build prerequisites are not satisfied",
            FailureClass::NativeBuild => "the native library failed to build",
            FailureClass::Artifacts => "build artifacts could not be copied",
            FailureClass::Bindings => "language bindings are missing",
            FailureClass::ExtensionCompile => "the extension module failed to compile",
        };

        let mut diag = Diagnostic::error(title);
        for line in detail.lines().filter(|l| !l.trim().is_empty()) {
            diag = diag.with_context(line.trim_end());
        }

        let windows = self.os == Os::Windows;
        let suggestions: Vec<&str> = match class {
            FailureClass::MissingToolchain => vec![
                "Run `extforge check-prerequisites` to see which tools are missing",
                "Run `extforge show-platform-help` for install commands",
            ],
            FailureClass::NativeBuild => {
                let mut s = vec![
                    "Run the native build command in the project root to see its full output",
                    "Update the Rust toolchain: rustup update",
                ];
                if windows {
                    s.push("Use a Developer Command Prompt so the MSVC linker is found");
                }
                s
            }
            FailureClass::Artifacts => {
                let mut s = vec![
                    "Check `[paths] native_target_dir` and `[library] name` in .extforge/config.toml",
                    "Make sure the native build produces a static library (crate-type = [\"staticlib\"])",
                ];
                if windows {
                    s.push("Set `[library] naming = \"msvc\"` or `\"mingw\"` to match your toolchain");
                }
                s
            }
            FailureClass::Bindings => vec![
                "Run `extforge generate-bindings` to regenerate the binding files",
                "Packaging builds (`extforge build --package`) regenerate them automatically",
            ],
            FailureClass::ExtensionCompile => vec![
                "Run `extforge build --verbose` to see the full compiler command",
                "Run `extforge check-prerequisites` to re-test the compiler",
                "Add the Python include directory to `[extension] include_dirs`",
            ],
        };

        suggestions
            .into_iter()
            .fold(diag, |d, s| d.with_suggestion(s))
    }

    /// The full installation and usage guide.
    pub fn platform_help() -> String {
        let sections: &[(&str, &[&str])] = &[
            (
                "PREREQUISITES",
                &[
                    "1. Rust toolchain (cargo)",
                    "2. SWIG (only needed to regenerate bindings)",
                    "3. C++11 compatible compiler",
                ],
            ),
            (
                "MACOS",
                &[
                    "# Install Homebrew if not already installed",
                    "/bin/bash -c \"$(curl -fsSL https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh)\"",
                    "brew install rust swig",
                    "xcode-select --install  # C++ compiler",
                ],
            ),
            (
                "LINUX",
                &[
                    "# Ubuntu/Debian:",
                    "sudo apt update",
                    "sudo apt install build-essential swig",
                    "curl --proto '=https' --tlsv1.2 -sSf https://sh.rustup.rs | sh",
                    "# Fedora:",
                    "sudo dnf groupinstall 'Development Tools'",
                    "sudo dnf install rust cargo swig",
                    "# Arch Linux:",
                    "sudo pacman -S base-devel rust swig",
                ],
            ),
            (
                "WINDOWS",
                &[
                    "# Option 1: winget",
                    "winget install Rustlang.Rustup",
                    "winget install SWIG.SWIG",
                    "winget install Microsoft.VisualStudio.2022.BuildTools",
                    "# Option 2: Chocolatey",
                    "choco install rust swig visualstudio2022buildtools",
                    "# Option 3: manual",
                    "# Rust: https://rustup.rs/",
                    "# SWIG: http://www.swig.org/download.html",
                ],
            ),
            (
                "BUILD COMMANDS",
                &[
                    "extforge check-prerequisites             # Probe compiler and tools",
                    "extforge check-prerequisites --packaging # Also require SWIG",
                    "extforge show-platform-help              # This guide",
                    "extforge generate-bindings               # Regenerate bindings",
                    "extforge build --install                 # Uses existing binding files",
                    "extforge build --package                 # Regenerates bindings first",
                    "extforge build --output-dir build        # Keep outputs out of src/",
                    "",
                    "Installation never runs SWIG; it uses the pre-generated files.",
                    "",
                    "Static library naming is platform-dependent:",
                    "  Linux/macOS:    libsigner.a",
                    "  Windows MSVC:   signer.lib",
                    "  Windows MinGW:  libsigner.a (or libsigner.lib)",
                    "Set `[library] naming` in .extforge/config.toml to pick one on Windows.",
                ],
            ),
            (
                "TROUBLESHOOTING",
                &[
                    "If cargo is not found: source ~/.cargo/env (Linux/macOS)",
                    "If the build fails: make sure every prerequisite is on PATH",
                    "On Windows: use a 'Developer Command Prompt' or 'x64 Native Tools' prompt",
                    "Check tool versions with: cargo --version, swig -version",
                    "Compiler problems: extforge check-prerequisites tests C++11 features",
                    "If the compiler test fails, set CXX to another compiler or upgrade it",
                ],
            ),
        ];

        let mut out = String::new();
        out.push_str(RULE);
        out.push_str("\nEXTFORGE PLATFORM INSTALLATION GUIDE\n");
        out.push_str(RULE);
        out.push('\n');

        for (title, lines) in sections {
            out.push_str(&format!("\n{}:\n", title));
            for line in lines.iter() {
                if line.is_empty() {
                    out.push('\n');
                } else {
                    out.push_str(&format!("   {}\n", line));
                }
            }
        }

        out.push('\n');
        out.push_str(RULE);
        out.push('\n');
        out
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
