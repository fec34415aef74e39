//! extforge - build orchestration for native extension modules
//!
//! This crate provides the library behind the `extforge` CLI: the C++
//! toolchain capability probe, platform-dependent artifact naming, binding
//! generation and the fail-fast build pipeline that ties them together.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and mocks for extforge unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides a scripted process executor and on-disk project fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{BuildMode, BuildStage, PlatformProfile};
pub use ops::BuildPipeline;
pub use util::context::GlobalContext;
