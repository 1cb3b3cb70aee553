//! Raw archive passthrough.
//!
//! Whole archives are streamed from disk unchanged. `Range` requests are
//! answered with `206 Partial Content`, which is how PMTiles clients read
//! individual tiles out of a single-file archive.

use std::convert::Infallible;
use std::path::Path;

use axum::{
    extract::Request,
    http::header::RANGE,
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

/// Serve the file at `path` for `request`, honoring any byte-range header.
///
/// `path` must already have been resolved through the sandbox.
pub async fn serve_file(path: &Path, request: Request) -> Response {
    debug!(
        path = %path.display(),
        range = request.headers().contains_key(RANGE),
        "Serving raw archive"
    );

    let result: Result<_, Infallible> = ServeFile::new(path).oneshot(request).await;
    match result {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
