//! Build steps.
//!
//! Each step wraps one external tool: the native build, the binding
//! generator, and the final extension compile. The toolchain module decides
//! which C++ compiler those steps use.

pub mod artifact;
pub mod bindings;
pub mod extension;
pub mod native;
pub mod toolchain;

pub use artifact::{copy_artifacts, CopiedArtifacts};
pub use bindings::{BindingGenerator, BindingReport};
pub use extension::ExtensionBuild;
pub use native::NativeBuild;
pub use toolchain::{ToolchainInfo, ToolchainProbe};
