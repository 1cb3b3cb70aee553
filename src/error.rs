use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving a requested path against the server root.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SandboxError {
    /// The resolved path escapes the configured root, or names a file other
    /// than the one served in single-file mode
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The resolved path is inside the root but does not exist
    #[error("File not found: {0}")]
    NotFound(String),
}

/// Errors that can occur when reading from an MBTiles archive
#[derive(Debug, Clone, Error)]
pub enum ArchiveError {
    /// No row matches the requested tile coordinates
    #[error("Tile not found: z={z} x={x} y={y}")]
    TileNotFound { z: i64, x: i64, y: i64 },

    /// The archive could not be opened
    #[error("Failed to open archive {path}: {message}")]
    Open { path: PathBuf, message: String },

    /// The archive opened but a query against it failed (missing table, not SQLite, ...)
    #[error("Query failed on {path}: {message}")]
    Query { path: PathBuf, message: String },

    /// The blocking worker running the query did not complete
    #[error("Archive worker failed: {0}")]
    Worker(String),
}

impl ArchiveError {
    /// Whether this error means "no such tile" rather than a backend failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArchiveError::TileNotFound { .. })
    }
}

/// Errors raised while building the server configuration at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configured file root does not exist or cannot be inspected
    #[error("Error accessing file path '{path}': {source}")]
    RootNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configured file root is a file without a usable name
    #[error("File path '{0}' has no file name")]
    InvalidFileName(PathBuf),
}

/// Errors produced while serving a single request
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    /// The path does not match any route
    #[error("No route for path: {0}")]
    RouteNotFound(String),

    /// The archive path could not be resolved inside the root
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    /// The archive could not be read
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}
