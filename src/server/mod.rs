//! HTTP server layer for the tile archive server.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │            GET {mount}/map/{archive}/{z}/{x}/{y}                │
//! │                                                                 │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌─────────────────┐  │
//! │  │  auth    │→ │ handlers │→ │ address  │→ │ viewer /        │  │
//! │  │ (Basic)  │  │ (router) │  │ (parser) │  │ passthrough     │  │
//! │  └──────────┘  └──────────┘  └──────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod address;
pub mod auth;
pub mod handlers;
pub mod passthrough;
pub mod routes;
pub mod viewer;

pub use address::{parse_map_path, MapRequest};
pub use auth::{auth_middleware, AuthError, BasicAuth};
pub use handlers::{dispatch_handler, AppState, ErrorResponse};
pub use passthrough::serve_file;
pub use routes::{create_router, RouterConfig};
pub use viewer::{wants_html, ViewerAssets};
