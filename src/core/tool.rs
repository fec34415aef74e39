//! Required external tools.

use std::fmt;

use serde::Serialize;

/// A required tool that is absent or unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MissingTool {
    #[serde(rename = "cargo")]
    Cargo,
    #[serde(rename = "swig")]
    Swig,
    #[serde(rename = "c++_compiler")]
    CxxCompiler,
}

impl MissingTool {
    /// Stable identifier.
    pub fn id(&self) -> &'static str {
        match self {
            MissingTool::Cargo => "cargo",
            MissingTool::Swig => "swig",
            MissingTool::CxxCompiler => "c++_compiler",
        }
    }
}

impl fmt::Display for MissingTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
