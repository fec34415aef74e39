//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Copy a file, creating the destination's parent directories.
///
/// Overwrites an existing destination.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dst)
        .with_context(|| format!("failed to copy {} to {}", src.display(), dst.display()))
}

/// Find files matching glob patterns relative to a base directory.
///
/// Matches keep the order of `patterns`; within one pattern they are sorted.
/// A file matched by several patterns is listed once. Patterns that match
/// nothing are returned separately so callers can report them.
pub fn glob_files(base: &Path, patterns: &[String]) -> Result<(Vec<PathBuf>, Vec<String>)> {
    let mut results: Vec<PathBuf> = Vec::new();
    let mut unmatched = Vec::new();

    for pattern in patterns {
        let full_pattern = base.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        let mut matched: Vec<PathBuf> = Vec::new();
        for entry in
            glob(&pattern_str).with_context(|| format!("invalid glob pattern: {}", pattern))?
        {
            match entry {
                Ok(path) if path.is_file() => matched.push(path),
                Ok(_) => {}
                Err(e) => tracing::warn!("glob error: {}", e),
            }
        }

        if matched.is_empty() {
            unmatched.push(pattern.clone());
        }

        matched.sort();
        for path in matched {
            if !results.contains(&path) {
                results.push(path);
            }
        }
    }

    Ok((results, unmatched))
}

/// `path` relative to `base` for display, or `path` unchanged.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_glob_files_keeps_pattern_order() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("signer_wrap.cxx"), "").unwrap();
        fs::write(src.join("a.cpp"), "").unwrap();
        fs::write(src.join("b.cpp"), "").unwrap();

        let (files, unmatched) = glob_files(
            tmp.path(),
            &["src/signer_wrap.cxx".to_string(), "src/*.cpp".to_string()],
        )
        .unwrap();

        assert!(unmatched.is_empty());
        assert_eq!(
            files,
            vec![src.join("signer_wrap.cxx"), src.join("a.cpp"), src.join("b.cpp")]
        );
    }

    #[test]
    fn test_glob_files_reports_unmatched_and_dedups() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("x.cpp"), "").unwrap();

        let (files, unmatched) = glob_files(
            tmp.path(),
            &["x.cpp".to_string(), "*.cpp".to_string(), "missing.cpp".to_string()],
        )
        .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(unmatched, vec!["missing.cpp".to_string()]);
    }

    #[test]
    fn test_copy_file_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("libsigner.a");
        fs::write(&src, "archive").unwrap();

        let dst = tmp.path().join("out/nested/libsigner.a");
        copy_file(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(dst).unwrap(), "archive");
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/proj"), Path::new("/proj/src/cxx.h")),
            PathBuf::from("src/cxx.h")
        );
    }
}
