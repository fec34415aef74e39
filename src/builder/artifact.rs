//! Platform-dependent artifact naming.
//!
//! The native build names its static library after the toolchain that
//! produced it. On Unix-like hosts there is a single convention; Windows has
//! the MSVC convention plus two MinGW-style ones.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

use crate::core::PlatformProfile;
use crate::util::config::LibraryNaming;
use crate::util::context::GlobalContext;
use crate::util::fs::copy_file;
use crate::util::process::Executor;

/// Ordered candidate file names for the static library `name`.
///
/// Never empty; the first element is the platform's primary convention.
pub fn library_candidates(platform: PlatformProfile, name: &str) -> Vec<String> {
    if platform.is_windows() {
        vec![
            format!("{}.lib", name),
            format!("lib{}.a", name),
            format!("lib{}.lib", name),
        ]
    } else {
        vec![format!("lib{}.a", name)]
    }
}

/// Candidate names restricted to a configured naming convention.
///
/// Naming only narrows the list on Windows.
pub fn library_candidates_for(
    platform: PlatformProfile,
    name: &str,
    naming: LibraryNaming,
) -> Vec<String> {
    let all = library_candidates(platform, name);
    if !platform.is_windows() {
        return all;
    }
    match naming {
        LibraryNaming::Auto => all,
        LibraryNaming::Msvc => all.into_iter().take(1).collect(),
        LibraryNaming::Mingw => all.into_iter().skip(1).collect(),
    }
}

/// Single best guess of the library name from which compilers are present.
///
/// On Windows a pure MSVC environment (`cl` without `gcc`) gets the MSVC
/// name; anything else gets the MinGW name. This guess favours MinGW when
/// both are present while [`library_candidates`] lists MSVC first, which is
/// why the pipeline links whatever [`resolve_library`] found instead.
pub fn expected_library_name_for(
    platform: PlatformProfile,
    name: &str,
    has_msvc: bool,
    has_gcc: bool,
) -> String {
    if platform.is_windows() && has_msvc && !has_gcc {
        format!("{}.lib", name)
    } else {
        format!("lib{}.a", name)
    }
}

/// [`expected_library_name_for`] with tool presence read from the host.
///
/// Informational only: the naming notice reports it, but linking always uses
/// the file [`resolve_library`] found.
pub fn expected_library_name(platform: PlatformProfile, name: &str, exec: &dyn Executor) -> String {
    expected_library_name_for(
        platform,
        name,
        exec.find_executable("cl").is_some(),
        exec.find_executable("gcc").is_some(),
    )
}

/// Whether both MSVC and MinGW compilers are visible on a Windows host, so
/// the two naming strategies could disagree.
pub fn naming_is_ambiguous(platform: PlatformProfile, exec: &dyn Executor) -> bool {
    platform.is_windows()
        && exec.find_executable("cl").is_some()
        && exec.find_executable("gcc").is_some()
}

/// Outcome of looking for the static library on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLibrary {
    /// File name used both in the build directory and at the destination
    pub file_name: String,
    /// Full path inside the build-output directory
    pub source: PathBuf,
    /// Whether `source` existed when resolved
    pub found: bool,
}

/// Pick the first candidate present in `dir`.
///
/// When nothing matches, the first candidate is returned with
/// `found == false` so the copy step can report the expected name.
pub fn resolve_library(dir: &Path, candidates: &[String]) -> Option<ResolvedLibrary> {
    for name in candidates {
        let path = dir.join(name);
        if path.is_file() {
            tracing::debug!("found static library {}", path.display());
            return Some(ResolvedLibrary {
                file_name: name.clone(),
                source: path,
                found: true,
            });
        }
    }

    candidates.first().map(|name| ResolvedLibrary {
        file_name: name.clone(),
        source: dir.join(name),
        found: false,
    })
}

/// Errors from locating or copying build artifacts.
#[derive(Debug, Error, Diagnostic)]
pub enum ArtifactError {
    #[error("expected {expected} in {}, not found", dir.display())]
    #[diagnostic(
        code(extforge::artifact::library_not_found),
        help("the native build should leave one of: {tried}")
    )]
    LibraryNotFound {
        expected: String,
        dir: PathBuf,
        tried: String,
    },

    #[error("failed to copy {} to {}: {message}", from.display(), to.display())]
    #[diagnostic(code(extforge::artifact::copy))]
    Copy {
        from: PathBuf,
        to: PathBuf,
        message: String,
    },
}

/// What the copy step placed in the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedArtifacts {
    /// Static library at its destination
    pub library: PathBuf,
    /// Bridge headers at their destinations
    pub headers: Vec<PathBuf>,
    /// Bridge headers that were not found where expected
    pub missing_headers: Vec<PathBuf>,
}

/// Copy the static library and the bridge headers into the output directory.
///
/// A missing library is an error; a missing header is only recorded.
pub fn copy_artifacts(ctx: &GlobalContext) -> Result<CopiedArtifacts, ArtifactError> {
    let library = &ctx.config().library;
    let candidates = library_candidates_for(ctx.platform(), &library.name, library.naming);
    let target_dir = ctx.native_target_dir();

    let resolved = resolve_library(&target_dir, &candidates)
        .filter(|r| r.found)
        .ok_or_else(|| ArtifactError::LibraryNotFound {
            expected: candidates.first().cloned().unwrap_or_default(),
            dir: target_dir.clone(),
            tried: candidates.join(", "),
        })?;

    let output_dir = ctx.output_dir();
    let dest = output_dir.join(&resolved.file_name);
    copy(&resolved.source, &dest)?;

    let mut headers = Vec::new();
    let mut missing_headers = Vec::new();
    let bridge_dir = ctx.bridge_dir();

    for header in &ctx.config().bridge.headers {
        let from = bridge_dir.join(&header.from);
        if !from.is_file() {
            tracing::warn!("bridge header {} not found", from.display());
            missing_headers.push(from);
            continue;
        }
        let to = output_dir.join(&header.to);
        copy(&from, &to)?;
        headers.push(to);
    }

    Ok(CopiedArtifacts {
        library: dest,
        headers,
        missing_headers,
    })
}

fn copy(from: &Path, to: &Path) -> Result<(), ArtifactError> {
    tracing::debug!("copying {} -> {}", from.display(), to.display());
    copy_file(from, to)
        .map(|_| ())
        .map_err(|e| ArtifactError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            message: format!("{:#}", e),
        })
}

/// File name of the final extension module.
pub fn extension_file_name(platform: PlatformProfile, module: &str) -> String {
    if platform.is_windows() {
        format!("{}.pyd", module)
    } else {
        format!("{}.so", module)
    }
}
