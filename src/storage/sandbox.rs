//! Sandboxed path resolution.
//!
//! The server exposes a single filesystem root. Two modes exist:
//!
//! - **Directory mode**: any file below the root may be requested by its
//!   relative path. The joined path is normalized and canonicalized, and the
//!   result must still sit below the root (compared component-wise, so a
//!   sibling such as `/data/maps-private` never passes for `/data/maps`).
//!
//!   `.` and `..` are collapsed lexically before canonicalization, so
//!   `link/../x` names `root/x` even when `link` is a symlink elsewhere.
//!   The filesystem would instead resolve it against the link target's
//!   parent. Either way the result must land below the root.
//! - **Single-file mode**: the root was configured as one archive file. Only
//!   that exact file name is accepted.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::error::SandboxError;

/// Resolves client paths against a fixed root without letting them escape it.
#[derive(Debug, Clone)]
pub struct PathSandbox {
    /// Canonical root directory
    root: PathBuf,

    /// Served file name when running in single-file mode
    file_name: Option<String>,
}

impl PathSandbox {
    /// Create a sandbox that serves any file below `root`.
    ///
    /// The root is canonicalized when possible so that it can be compared
    /// against canonicalized request paths.
    pub fn directory(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::fs::canonicalize(&root).unwrap_or(root);
        Self {
            root,
            file_name: None,
        }
    }

    /// Create a sandbox that serves exactly one file, `root/file_name`.
    pub fn single_file(root: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        let root = root.into();
        let root = std::fs::canonicalize(&root).unwrap_or(root);
        Self {
            root,
            file_name: Some(file_name.into()),
        }
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The served file name, if running in single-file mode.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Whether the sandbox serves a single file.
    pub fn is_single_file(&self) -> bool {
        self.file_name.is_some()
    }

    /// Resolve a client-supplied relative path to a file inside the root.
    ///
    /// # Errors
    ///
    /// - [`SandboxError::AccessDenied`] if the path escapes the root, or does
    ///   not match the served file in single-file mode
    /// - [`SandboxError::NotFound`] if the path is inside the root but missing
    pub fn resolve(&self, requested: &str) -> Result<PathBuf, SandboxError> {
        if let Some(ref name) = self.file_name {
            if requested != name {
                debug!(requested = requested, "Single-file mode name mismatch");
                return Err(SandboxError::AccessDenied(requested.to_string()));
            }
            return Ok(self.root.join(name));
        }

        // Lexical check first: catches `..` traversal even when the target
        // does not exist and canonicalize() cannot run.
        let joined = normalize_lexically(&self.root.join(requested));
        if !joined.starts_with(&self.root) {
            warn!(requested = requested, "Rejected path outside of root");
            return Err(SandboxError::AccessDenied(requested.to_string()));
        }

        let canonical = match std::fs::canonicalize(&joined) {
            Ok(path) => path,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SandboxError::NotFound(requested.to_string()));
            }
            Err(e) => {
                debug!(requested = requested, error = %e, "Failed to canonicalize path");
                return Err(SandboxError::NotFound(requested.to_string()));
            }
        };

        // Symlinks may still point outside the root.
        if !canonical.starts_with(&self.root) {
            warn!(requested = requested, "Rejected symlink outside of root");
            return Err(SandboxError::AccessDenied(requested.to_string()));
        }

        Ok(canonical)
    }
}

/// Normalize `.` and `..` components without touching the filesystem.
///
/// `..` at the filesystem root stays at the root.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}
