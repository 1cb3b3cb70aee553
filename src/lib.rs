//! # Tile Archive Server
//!
//! Serves pre-rendered map tile archives over HTTP.
//!
//! Two archive formats are supported:
//!
//! - **MBTiles**: SQLite databases. Tiles are looked up per request by their
//!   XYZ address (converted to the TMS rows MBTiles stores), and the metadata
//!   table is exposed as JSON.
//! - **PMTiles**: single-file archives streamed as raw bytes with byte-range
//!   support, so clients can read tiles without a server-side query engine.
//!
//! ## Features
//!
//! - **Sandboxed root**: archive paths never resolve outside the configured
//!   directory, or to anything but the one file in single-file mode
//! - **Built-in web viewer**: browsers requesting an archive get a MapLibre page
//! - **Authentication**: optional HTTP Basic auth with a static credential
//!
//! ## Architecture
//!
//! - [`storage`] - Path sandbox over the filesystem root
//! - [`archive`] - MBTiles reader and archive classification
//! - [`server`] - Axum router, handlers, auth and viewer
//! - [`config`] - CLI and runtime configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use tile_archive_server::{create_router, RouterConfig, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::new("/maps/", "./tiles", "")?;
//!     let router = create_router(config, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("localhost:35248").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod server;
pub mod storage;

// Re-export commonly used types
pub use archive::{
    is_gzip, normalize_metadata, tms_row, ArchiveKind, MbTilesArchive, Metadata, MetadataValue,
    TileCoordinate, TileData,
};
pub use config::{Config, ServerConfig};
pub use error::{ArchiveError, ConfigError, RequestError, SandboxError};
pub use server::{
    create_router, parse_map_path, AppState, AuthError, BasicAuth, ErrorResponse, MapRequest,
    RouterConfig, ViewerAssets,
};
pub use storage::PathSandbox;
