//! Core data types shared by the probe and the pipeline.

pub mod mode;
pub mod platform;
pub mod stage;
pub mod tool;

pub use mode::BuildMode;
pub use platform::{Os, PlatformProfile};
pub use stage::{BuildStage, FailureClass};
pub use tool::MissingTool;
