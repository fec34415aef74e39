//! High-level operations.
//!
//! This module contains the implementation of extforge commands.

pub mod pipeline;
pub mod prerequisites;

pub use pipeline::{
    naming_notice, BuildPipeline, PipelineError, PipelineEvent, PipelineOutput, PipelineStep,
};
pub use prerequisites::{check_prerequisites, format_report, CheckResult, PrerequisiteReport};
