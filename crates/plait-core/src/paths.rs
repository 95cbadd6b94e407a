//! Input path resolution.
//!
//! Inputs may be given relative to a base directory or found across an
//! ordered list of library directories. Resolution is purely a matter
//! of existence checks plus lexical normalization, so it is
//! deterministic for a fixed filesystem state.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable extending the module search path
/// (`:`-separated directories). Extends configured paths, never
/// replaces them.
pub const PATH_ENV: &str = "PLAIT_PATH";

/// Ordered list of directories searched when resolving inputs.
///
/// An empty list is legal; resolution then falls back to
/// exists-as-given.
#[derive(Debug, Clone, Default)]
pub struct SearchPaths {
    dirs: Vec<PathBuf>,
}

impl SearchPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one directory to the search path.
    pub fn push(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.push(dir.into());
    }

    /// Append `:`-separated directories from an environment variable.
    pub fn extend_from_env(&mut self, var: &str) {
        if let Ok(value) = std::env::var(var) {
            for dir in value.split(':').filter(|d| !d.is_empty()) {
                self.dirs.push(PathBuf::from(dir));
            }
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Resolve a requested input to a concrete existing file.
    ///
    /// Tries `relative_to/file` first for relative inputs, then the
    /// file as given, then each library directory in order (first match
    /// wins). The result is lexically normalized. Fails with
    /// [`Error::NotFound`] carrying the original request.
    pub fn resolve(&self, file: &Path, relative_to: Option<&Path>) -> Result<PathBuf> {
        if let Some(base) = relative_to {
            if file.is_relative() {
                let candidate = base.join(file);
                if candidate.exists() {
                    return Ok(normalize(&candidate));
                }
            }
        }

        if file.exists() {
            return Ok(normalize(file));
        }

        for dir in &self.dirs {
            let candidate = dir.join(file);
            if candidate.exists() {
                return Ok(normalize(&candidate));
            }
        }

        Err(Error::NotFound {
            path: file.to_path_buf(),
        })
    }
}

/// Lexically resolve `.` and `..` components without touching the
/// filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Keep leading `..` on relative paths; `/..` is `/`.
                let popped = out.pop();
                if !popped && out.as_os_str().is_empty() {
                    out.push(Component::ParentDir.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }

    if out.as_os_str().is_empty() {
        out.push(".");
    }

    out
}
