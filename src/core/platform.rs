//! Host platform detection.

use std::fmt;

use serde::Serialize;

/// Operating system family the pipeline runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Linux,
    Darwin,
    Windows,
    Other,
}

impl Os {
    /// Map a `std::env::consts::OS` value onto an OS family.
    pub fn from_consts(os: &str) -> Self {
        match os {
            "linux" => Os::Linux,
            "macos" | "darwin" => Os::Darwin,
            "windows" => Os::Windows,
            _ => Os::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Darwin => "darwin",
            Os::Windows => "windows",
            Os::Other => "other",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facts about the host that stay fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformProfile {
    pub os: Os,
}

impl PlatformProfile {
    /// Create a profile for an explicit OS (used by tests and cross checks).
    pub fn new(os: Os) -> Self {
        PlatformProfile { os }
    }

    /// Detect the host platform.
    pub fn host() -> Self {
        PlatformProfile::new(Os::from_consts(std::env::consts::OS))
    }

    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    /// File extension of executables produced on this platform.
    pub fn exe_suffix(&self) -> &'static str {
        if self.is_windows() {
            ".exe"
        } else {
            ""
        }
    }
}

impl fmt::Display for PlatformProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.os)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_from_consts() {
        assert_eq!(Os::from_consts("linux"), Os::Linux);
        assert_eq!(Os::from_consts("macos"), Os::Darwin);
        assert_eq!(Os::from_consts("windows"), Os::Windows);
        assert_eq!(Os::from_consts("freebsd"), Os::Other);
    }

    #[test]
    fn test_exe_suffix() {
        assert_eq!(PlatformProfile::new(Os::Windows).exe_suffix(), ".exe");
        assert_eq!(PlatformProfile::new(Os::Linux).exe_suffix(), "");
    }

    #[test]
    fn test_host_matches_consts() {
        let host = PlatformProfile::host();
        assert_eq!(host.os, Os::from_consts(std::env::consts::OS));
    }
}
