//! Pipeline entry mode.

use std::fmt;

use serde::Serialize;

/// Whether bindings are generated (packaging) or only verified (install).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Use pre-generated binding files; the generator is never invoked.
    #[default]
    Install,
    /// Regenerate bindings with the external generator before verifying them.
    Package,
}

impl BuildMode {
    pub fn from_packaging(packaging: bool) -> Self {
        if packaging {
            BuildMode::Package
        } else {
            BuildMode::Install
        }
    }

    pub fn is_packaging(&self) -> bool {
        *self == BuildMode::Package
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Install => f.write_str("installation"),
            BuildMode::Package => f.write_str("packaging"),
        }
    }
}
