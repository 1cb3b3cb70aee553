//! HTTP Basic authentication for the tile archive server.
//!
//! When a credential is configured, every request must carry
//!
//! ```text
//! Authorization: Basic <credential>
//! ```
//!
//! where `<credential>` is byte-for-byte the configured string. The configured
//! value is already base64-encoded (`dXNlcjpwYXNz` for `user:pass`); it is
//! never decoded on the server side.
//!
//! # Security Properties
//!
//! - **Constant-time comparison**: the payload is compared with `subtle`
//! - **Challenge on failure**: every 401 carries `WWW-Authenticate: Basic realm="Maps"`
//! - **Runs first**: the check happens before any routing, so unauthenticated
//!   clients learn nothing about which paths exist
//!
//! # Example
//!
//! ```rust
//! use tile_archive_server::server::auth::BasicAuth;
//! use http::HeaderValue;
//!
//! let auth = BasicAuth::new("dXNlcjpwYXNz");
//! let header = HeaderValue::from_static("Basic dXNlcjpwYXNz");
//! assert!(auth.verify(Some(&header)).is_ok());
//! assert!(auth.verify(None).is_err());
//! ```

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
        HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::handlers::ErrorResponse;

/// Authorization scheme prefix, matched case-sensitively.
const BASIC_PREFIX: &str = "Basic ";

/// Challenge sent with every 401 response.
pub const BASIC_CHALLENGE: &str = "Basic realm=\"Maps\"";

// =============================================================================
// Types
// =============================================================================

/// Authentication error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No Authorization header was sent
    MissingCredentials,

    /// The Authorization header does not use the Basic scheme
    UnsupportedScheme,

    /// The Basic payload does not match the configured credential
    InvalidCredentials,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredentials => write!(f, "Missing credentials"),
            AuthError::UnsupportedScheme => write!(f, "Unsupported authorization scheme"),
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = StatusCode::UNAUTHORIZED;

        // A wrong credential could be an attack; a missing one is usually a
        // browser before its first prompt.
        match &self {
            AuthError::InvalidCredentials | AuthError::UnsupportedScheme => {
                warn!(status = status.as_u16(), "Authentication failed: {}", self);
            }
            AuthError::MissingCredentials => {
                debug!(status = status.as_u16(), "Authentication failed: {}", self);
            }
        }

        let body = ErrorResponse::with_status("unauthorized", "Unauthorized", status);
        let mut response = (status, Json(body)).into_response();
        response.headers_mut().insert(
            WWW_AUTHENTICATE,
            HeaderValue::from_static(BASIC_CHALLENGE),
        );
        response
    }
}

// =============================================================================
// Basic Authentication
// =============================================================================

/// Verifier for a single static Basic credential.
#[derive(Clone)]
pub struct BasicAuth {
    /// Pre-encoded credential, compared verbatim
    credential: Vec<u8>,
}

impl BasicAuth {
    /// Create a verifier for the given pre-encoded credential.
    pub fn new(credential: impl AsRef<[u8]>) -> Self {
        Self {
            credential: credential.as_ref().to_vec(),
        }
    }

    /// Check an `Authorization` header value.
    pub fn verify(&self, header: Option<&HeaderValue>) -> Result<(), AuthError> {
        let header = header.ok_or(AuthError::MissingCredentials)?;
        let payload = header
            .as_bytes()
            .strip_prefix(BASIC_PREFIX.as_bytes())
            .ok_or(AuthError::UnsupportedScheme)?;

        if payload.ct_eq(self.credential.as_slice()).into() {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Axum middleware rejecting requests without the configured Basic credential.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware};
/// use tile_archive_server::server::auth::{BasicAuth, auth_middleware};
///
/// let auth = BasicAuth::new("dXNlcjpwYXNz");
/// let app = Router::new()
///     .fallback(handler)
///     .layer(middleware::from_fn_with_state(auth, auth_middleware));
/// ```
pub async fn auth_middleware(
    State(auth): State<BasicAuth>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    auth.verify(request.headers().get(AUTHORIZATION))?;
    Ok(next.run(request).await)
}

// =============================================================================
// Tests
// =============================================================================
