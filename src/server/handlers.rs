//! HTTP request handlers for the tile archive server.
//!
//! All requests go through [`dispatch_handler`], which strips the configured
//! mount prefix and routes the remainder by literal string matching.
//!
//! # Endpoints
//!
//! Relative to the mount prefix (default `/maps/`):
//!
//! - `` - Informational text, or a redirect to the archive in single-file mode
//! - `web/{asset}` - Viewer static assets
//! - `map/{archive}/metadata.json` - Archive metadata as JSON
//! - `map/{archive}/{z}/{x}/{y}` - Tile from an MBTiles archive
//! - `map/{archive}` - Whole archive, or the HTML viewer for browsers

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error};

use crate::archive::{ArchiveKind, MbTilesArchive, TileCoordinate, TILE_CONTENT_TYPE};
use crate::config::ServerConfig;
use crate::error::{ArchiveError, RequestError};

use super::address::{parse_map_path, MapRequest};
use super::passthrough::serve_file;
use super::viewer::{asset_content_type, wants_html, ViewerAssets};

/// Namespace for viewer static assets.
const WEB_NAMESPACE: &str = "web/";

/// Namespace for archive requests.
const MAP_NAMESPACE: &str = "map/";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// Cloned into every request; all fields are read-only.
#[derive(Clone)]
pub struct AppState {
    /// Immutable server configuration
    pub config: Arc<ServerConfig>,

    /// Viewer template and static files
    pub assets: ViewerAssets,
}

impl AppState {
    /// Create application state with the embedded viewer assets.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_assets(config, ViewerAssets::embedded())
    }

    /// Create application state with custom viewer assets.
    pub fn with_assets(config: ServerConfig, assets: ViewerAssets) -> Self {
        Self {
            config: Arc::new(config),
            assets,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert RequestError to HTTP response.
///
/// Sandbox rejections and missing files produce the same response so that
/// clients cannot probe the layout of the filesystem root. Backend details
/// are logged but never sent to the client.
impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            RequestError::RouteNotFound(_) => (StatusCode::NOT_FOUND, "not_found", "Not found"),
            RequestError::Sandbox(_) => (StatusCode::NOT_FOUND, "not_found", "File not found"),
            RequestError::Archive(ArchiveError::TileNotFound { .. }) => {
                (StatusCode::NOT_FOUND, "not_found", "Tile not found")
            }
            RequestError::Archive(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                "Database error",
            ),
        };

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                self
            );
        } else {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                self
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Route a request under the mount prefix.
///
/// The path is percent-decoded before matching, so encoded traversal
/// sequences reach the sandbox in their decoded form.
pub async fn dispatch_handler(State(state): State<AppState>, request: Request) -> Response {
    let raw_path = request.uri().path().to_string();
    let path = match urlencoding::decode(&raw_path) {
        Ok(path) => path.into_owned(),
        Err(_) => return RequestError::RouteNotFound(raw_path).into_response(),
    };

    let Some(rest) = path.strip_prefix(state.config.mount_path()) else {
        return RequestError::RouteNotFound(path.clone()).into_response();
    };

    if rest.is_empty() || rest == "/" {
        return root_response(&state);
    }

    if let Some(asset) = rest.strip_prefix(WEB_NAMESPACE) {
        return static_handler(&state, asset).into_response();
    }

    if let Some(map_path) = rest.strip_prefix(MAP_NAMESPACE) {
        return map_handler(&state, map_path, request).await.into_response();
    }

    RequestError::RouteNotFound(rest.to_string()).into_response()
}

/// Response for the mount root.
///
/// Single-file mode redirects to the served archive; directory mode answers
/// with a short informational message.
fn root_response(state: &AppState) -> Response {
    let mount = state.config.mount_path();
    match state.config.sandbox().file_name() {
        Some(file_name) => {
            let target = format!("{}{}{}", mount, MAP_NAMESPACE, file_name);
            debug!(target = %target, "Redirecting to single archive");
            match HeaderValue::from_str(&target) {
                Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
                Err(_) => RequestError::RouteNotFound(target).into_response(),
            }
        }
        None => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!(
                "Map server running. Access {}{}{{filename}}",
                mount, MAP_NAMESPACE
            ),
        )
            .into_response(),
    }
}

/// Serve a viewer static asset.
fn static_handler(state: &AppState, name: &str) -> Result<Response, RequestError> {
    let data = state
        .assets
        .file(name)
        .ok_or_else(|| RequestError::RouteNotFound(format!("{}{}", WEB_NAMESPACE, name)))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, asset_content_type(name))],
        data,
    )
        .into_response())
}

/// Handle a request under the `map/` namespace.
async fn map_handler(
    state: &AppState,
    map_path: &str,
    request: Request,
) -> Result<Response, RequestError> {
    let map_request =
        parse_map_path(map_path).ok_or_else(|| RequestError::RouteNotFound(map_path.to_string()))?;

    match map_request {
        MapRequest::Metadata { archive } => metadata_handler(state, &archive).await,
        MapRequest::Tile { archive, coord } => tile_handler(state, &archive, coord).await,
        MapRequest::Archive { archive, kind } => {
            archive_handler(state, &archive, kind, request).await
        }
    }
}

/// Handle metadata requests.
///
/// # Response
///
/// - `200 OK`: JSON object of the archive's metadata table
/// - `404 Not Found`: Archive missing or outside the root
/// - `500 Internal Server Error`: Archive unreadable or without a metadata table
async fn metadata_handler(state: &AppState, archive: &str) -> Result<Response, RequestError> {
    let path = state.config.sandbox().resolve(archive)?;
    let metadata = MbTilesArchive::new(path).get_metadata().await?;
    Ok(Json(metadata).into_response())
}

/// Handle tile requests.
///
/// # Response
///
/// - `200 OK`: Raw tile blob
/// - `404 Not Found`: Archive missing, or no tile at these coordinates
/// - `500 Internal Server Error`: Archive unreadable
///
/// # Headers
///
/// - `Content-Type: application/x-protobuf`
/// - `Access-Control-Allow-Origin: *`
/// - `Content-Encoding: gzip` when the blob is gzip-compressed
async fn tile_handler(
    state: &AppState,
    archive: &str,
    coord: TileCoordinate,
) -> Result<Response, RequestError> {
    let path = state.config.sandbox().resolve(archive)?;
    let tile = MbTilesArchive::new(path).get_tile(coord).await?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::CONTENT_TYPE, TILE_CONTENT_TYPE);
    if tile.gzip {
        builder = builder.header(header::CONTENT_ENCODING, "gzip");
    }

    // Static header values cannot fail to build.
    Ok(builder
        .body(Body::from(tile.data))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()))
}

/// Handle whole-archive requests.
///
/// PMTiles range reads go straight to the file. Otherwise a browser asking
/// for HTML gets the viewer page, and everyone else gets the raw archive.
async fn archive_handler(
    state: &AppState,
    archive: &str,
    kind: ArchiveKind,
    request: Request,
) -> Result<Response, RequestError> {
    let path = state.config.sandbox().resolve(archive)?;

    if kind == ArchiveKind::PmTiles && request.headers().contains_key(header::RANGE) {
        return Ok(serve_file(&path, request).await);
    }

    if wants_html(request.headers()) {
        let mount = state.config.mount_path();
        let root_path = format!("{}{}", mount, WEB_NAMESPACE.trim_end_matches('/'));
        let file = format!("{}{}{}", mount, MAP_NAMESPACE, archive);
        debug!(archive = archive, format = kind.name(), "Rendering viewer");
        return Ok(Html(state.assets.render_viewer(&root_path, &file)).into_response());
    }

    Ok(serve_file(&path, request).await)
}
