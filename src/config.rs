//! Configuration management for the tile archive server.
//!
//! Two layers live here:
//!
//! - [`Config`]: command-line arguments via clap, each with a `MAPS_`-prefixed
//!   environment variable fallback
//! - [`ServerConfig`]: the immutable runtime settings handed to the router,
//!   built once at startup from the filesystem root
//!
//! # Environment Variables
//!
//! - `MAPS_HOST` - Server bind address (default: localhost)
//! - `MAPS_PORT` - Server port (default: 35248)
//! - `MAPS_WEB_PATH` - URL path prefix the server is mounted at (default: /maps/)
//! - `MAPS_FILE_PATH` - Archive directory, or a single archive file (default: .)
//! - `MAPS_WEB_AUTH` - Basic auth credential, `user:password` or base64
//! - `MAPS_LOG_FILE` - Append logs to this file instead of stderr

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::Parser;

use crate::error::ConfigError;
use crate::storage::PathSandbox;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default server port.
pub const DEFAULT_PORT: u16 = 35248;

/// Default URL path prefix.
pub const DEFAULT_WEB_PATH: &str = "/maps/";

/// Default filesystem root.
pub const DEFAULT_FILE_PATH: &str = ".";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Tile Archive Server - serves MBTiles and PMTiles archives over HTTP.
#[derive(Parser, Debug, Clone)]
#[command(name = "tile-archive-server")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind to.
    #[arg(long, default_value = DEFAULT_HOST, env = "MAPS_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "MAPS_PORT")]
    pub port: u16,

    /// HTTP URL path prefix.
    #[arg(long, default_value = DEFAULT_WEB_PATH, env = "MAPS_WEB_PATH")]
    pub web_path: String,

    /// Path to a single archive file or to a directory of archives.
    #[arg(long, default_value = DEFAULT_FILE_PATH, env = "MAPS_FILE_PATH")]
    pub file_path: PathBuf,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// HTTP Basic Auth credential, as "user:password" or its base64 encoding.
    ///
    /// When empty, all routes are public.
    #[arg(long, env = "MAPS_WEB_AUTH")]
    pub web_auth: Option<String>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable logging.
    #[arg(long, default_value_t = false)]
    pub log: bool,

    /// Path to a log file (implies --log).
    #[arg(long, env = "MAPS_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !self.web_path.starts_with('/') {
            return Err(format!(
                "web_path must start with '/', got '{}'",
                self.web_path
            ));
        }

        if self.host.is_empty() {
            return Err("host must not be empty".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether any log output should be produced.
    pub fn logging_enabled(&self) -> bool {
        self.log || self.log_file.is_some()
    }

    /// The shared secret compared against `Authorization: Basic` payloads.
    ///
    /// A clear `user:password` pair is base64-encoded; anything else is
    /// assumed to be encoded already. Empty when auth is disabled.
    pub fn auth_credential(&self) -> String {
        match self.web_auth.as_deref() {
            None | Some("") => String::new(),
            Some(value) if value.contains(':') => STANDARD.encode(value),
            Some(value) => value.to_string(),
        }
    }

    /// Build the immutable runtime configuration.
    pub fn server_config(&self) -> Result<ServerConfig, ConfigError> {
        ServerConfig::new(&self.web_path, &self.file_path, self.auth_credential())
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Immutable settings shared read-only by every request.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// URL path prefix, matched literally
    mount_path: String,

    /// Filesystem root and single-file selection
    sandbox: PathSandbox,

    /// Pre-encoded Basic credential; `None` disables auth
    auth_secret: Option<String>,
}

impl ServerConfig {
    /// Build the runtime configuration.
    ///
    /// `file_path` may name a directory (every archive below it is served) or
    /// a single archive file (only that file is served).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RootNotFound`] when `file_path` cannot be inspected.
    pub fn new(
        mount_path: impl Into<String>,
        file_path: impl AsRef<Path>,
        auth_secret: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let file_path = file_path.as_ref();
        let absolute = if file_path.is_absolute() {
            file_path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(file_path))
                .unwrap_or_else(|_| file_path.to_path_buf())
        };

        let info = std::fs::metadata(&absolute).map_err(|source| ConfigError::RootNotFound {
            path: absolute.clone(),
            source,
        })?;

        let sandbox = if info.is_dir() {
            PathSandbox::directory(&absolute)
        } else {
            let file_name = absolute
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| ConfigError::InvalidFileName(absolute.clone()))?
                .to_string();
            let parent = absolute
                .parent()
                .ok_or_else(|| ConfigError::InvalidFileName(absolute.clone()))?;
            PathSandbox::single_file(parent, file_name)
        };

        let auth_secret = auth_secret.into();
        Ok(Self {
            mount_path: mount_path.into(),
            sandbox,
            auth_secret: (!auth_secret.is_empty()).then_some(auth_secret),
        })
    }

    /// URL path prefix.
    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    /// Path sandbox for the configured root.
    pub fn sandbox(&self) -> &PathSandbox {
        &self.sandbox
    }

    /// Basic auth credential, if auth is enabled.
    pub fn auth_secret(&self) -> Option<&str> {
        self.auth_secret.as_deref()
    }
}

// =============================================================================
// Tests
// =============================================================================
