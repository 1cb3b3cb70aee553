//! Router configuration for the tile archive server.
//!
//! Routing below the mount prefix is done by [`dispatch_handler`] with literal
//! string matching, so the axum router consists of a single fallback wrapped
//! in the middleware stack:
//!
//! ```text
//! TraceLayer (optional)
//!   └─ Basic auth (when a credential is configured)
//!        └─ dispatch_handler
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tile_archive_server::config::ServerConfig;
//! use tile_archive_server::server::routes::{create_router, RouterConfig};
//!
//! let config = ServerConfig::new("/maps/", "./tiles", "")?;
//! let router = create_router(config, RouterConfig::new());
//!
//! let listener = tokio::net::TcpListener::bind("localhost:35248").await?;
//! axum::serve(listener, router).await?;
//! ```

use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

use super::auth::{auth_middleware, BasicAuth};
use super::handlers::{dispatch_handler, AppState};
use super::viewer::ViewerAssets;
use crate::config::ServerConfig;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Viewer template and static files
    pub assets: ViewerAssets,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration with the embedded viewer and tracing on.
    pub fn new() -> Self {
        Self {
            assets: ViewerAssets::embedded(),
            enable_tracing: true,
        }
    }

    /// Replace the viewer assets.
    pub fn with_assets(mut self, assets: ViewerAssets) -> Self {
        self.assets = assets;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Authentication, when configured, guards every path, including paths
/// outside the mount prefix.
pub fn create_router(config: ServerConfig, router_config: RouterConfig) -> Router {
    let auth = config.auth_secret().map(BasicAuth::new);
    let app_state = AppState::with_assets(config, router_config.assets);

    let router = Router::new()
        .fallback(dispatch_handler)
        .with_state(app_state);

    let router = match auth {
        Some(auth) => router.layer(middleware::from_fn_with_state(auth, auth_middleware)),
        None => router,
    };

    if router_config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

// =============================================================================
// Tests
// =============================================================================
