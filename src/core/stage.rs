//! Build stage state machine.

use std::fmt;

use serde::Serialize;

/// Where a pipeline run currently stands.
///
/// Stages only move forward. Any stage may move to [`BuildStage::Failed`],
/// which is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", content = "reason", rename_all = "kebab-case")]
pub enum BuildStage {
    NotStarted,
    ToolchainVerified,
    NativeLibraryBuilt,
    ArtifactsCopied,
    BindingsReady,
    Completed,
    Failed(String),
}

impl BuildStage {
    /// Position in the forward order; `None` for `Failed`.
    pub fn ordinal(&self) -> Option<u8> {
        match self {
            BuildStage::NotStarted => Some(0),
            BuildStage::ToolchainVerified => Some(1),
            BuildStage::NativeLibraryBuilt => Some(2),
            BuildStage::ArtifactsCopied => Some(3),
            BuildStage::BindingsReady => Some(4),
            BuildStage::Completed => Some(5),
            BuildStage::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BuildStage::Failed(_))
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildStage::Completed | BuildStage::Failed(_))
    }

    /// Whether moving from `self` to `next` is allowed.
    ///
    /// Only the immediate successor or `Failed` is reachable from a
    /// non-terminal stage.
    pub fn can_advance_to(&self, next: &BuildStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.ordinal(), next.ordinal()) {
            (Some(_), None) => true,
            (Some(cur), Some(nxt)) => nxt == cur + 1,
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuildStage::NotStarted => "not-started",
            BuildStage::ToolchainVerified => "toolchain-verified",
            BuildStage::NativeLibraryBuilt => "native-library-built",
            BuildStage::ArtifactsCopied => "artifacts-copied",
            BuildStage::BindingsReady => "bindings-ready",
            BuildStage::Completed => "completed",
            BuildStage::Failed(_) => "failed",
        }
    }
}

/// Why a pipeline run stopped, one per stage that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureClass {
    MissingToolchain,
    NativeBuild,
    Artifacts,
    Bindings,
    ExtensionCompile,
}

impl FailureClass {
    /// Reason recorded in [`BuildStage::Failed`].
    pub fn reason(&self) -> &'static str {
        match self {
            FailureClass::MissingToolchain => "missing toolchain",
            FailureClass::NativeBuild => "native build error",
            FailureClass::Artifacts => "artifact missing/copy error",
            FailureClass::Bindings => "bindings missing",
            FailureClass::ExtensionCompile => "extension compile error",
        }
    }

    /// The stage this failure ends.
    pub fn stage(&self) -> BuildStage {
        BuildStage::Failed(self.reason().to_string())
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStage::Failed(reason) => write!(f, "failed ({})", reason),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only() {
        assert!(BuildStage::NotStarted.can_advance_to(&BuildStage::ToolchainVerified));
        assert!(!BuildStage::NotStarted.can_advance_to(&BuildStage::NativeLibraryBuilt));
        assert!(!BuildStage::ArtifactsCopied.can_advance_to(&BuildStage::NativeLibraryBuilt));
        assert!(BuildStage::BindingsReady.can_advance_to(&BuildStage::Completed));
    }

    #[test]
    fn test_any_live_stage_can_fail() {
        let failed = BuildStage::Failed("x".into());
        assert!(BuildStage::NotStarted.can_advance_to(&failed));
        assert!(BuildStage::BindingsReady.can_advance_to(&failed));
    }

    #[test]
    fn test_terminal_stages_are_final() {
        let failed = BuildStage::Failed("native build error".into());
        assert!(!failed.can_advance_to(&BuildStage::Completed));
        assert!(!failed.can_advance_to(&BuildStage::Failed("again".into())));
        assert!(!BuildStage::Completed.can_advance_to(&failed));
        assert_eq!(failed.to_string(), "failed (native build error)");
    }

    #[test]
    fn test_failure_class_reasons() {
        assert_eq!(
            FailureClass::Artifacts.stage(),
            BuildStage::Failed("artifact missing/copy error".into())
        );
        assert_eq!(FailureClass::MissingToolchain.reason(), "missing toolchain");
    }

    #[test]
    fn test_stage_serializes_with_reason() {
        let json = serde_json::to_string(&FailureClass::Bindings.stage()).unwrap();
        assert_eq!(json, r#"{"stage":"failed","reason":"bindings missing"}"#);
        let json = serde_json::to_string(&BuildStage::Completed).unwrap();
        assert_eq!(json, r#"{"stage":"completed"}"#);
    }
}
