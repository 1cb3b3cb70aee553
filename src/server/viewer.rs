//! Viewer module - the HTML map viewer page and its static assets.
//!
//! The assets are injected into the router at construction time; by default
//! they are compiled into the binary from the `assets/` directory.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::header::ACCEPT;
use http::HeaderMap;

/// Placeholder replaced by the mount-relative static asset root.
const ROOT_PATH_PLACEHOLDER: &str = "{{root_path}}";

/// Placeholder replaced by the mount-relative archive URL.
const FILE_PLACEHOLDER: &str = "{{file}}";

/// Media type a browser sends when it wants a document.
const HTML_MEDIA_TYPE: &str = "text/html";

/// Escape HTML special characters to prevent XSS attacks.
fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Whether the client asked for an HTML document.
///
/// Only whole-archive requests are negotiated; tiles and metadata never are.
pub fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.contains(HTML_MEDIA_TYPE))
}

/// Content type for a static asset, by extension.
pub fn asset_content_type(name: &str) -> &'static str {
    let extension = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match extension {
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "html" => "text/html; charset=utf-8",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Read-only viewer template and static files.
#[derive(Debug, Clone)]
pub struct ViewerAssets {
    template: Arc<str>,
    files: Arc<HashMap<String, Bytes>>,
}

impl ViewerAssets {
    /// Create assets from a viewer template and no static files.
    ///
    /// The template may reference `{{root_path}}` and `{{file}}`.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: Arc::from(template.into()),
            files: Arc::new(HashMap::new()),
        }
    }

    /// The viewer and assets shipped with the binary.
    pub fn embedded() -> Self {
        Self::new(include_str!("../../assets/index.html"))
            .with_file(
                "index.html",
                Bytes::from_static(include_bytes!("../../assets/index.html")),
            )
            .with_file(
                "viewer.js",
                Bytes::from_static(include_bytes!("../../assets/viewer.js")),
            )
            .with_file(
                "viewer.css",
                Bytes::from_static(include_bytes!("../../assets/viewer.css")),
            )
    }

    /// Add a static file served under `web/{name}`.
    pub fn with_file(mut self, name: impl Into<String>, data: Bytes) -> Self {
        Arc::make_mut(&mut self.files).insert(name.into(), data);
        self
    }

    /// Look up a static file.
    pub fn file(&self, name: &str) -> Option<Bytes> {
        self.files.get(name).cloned()
    }

    /// Render the viewer page for one archive.
    ///
    /// # Arguments
    ///
    /// * `root_path` - Mount-relative root of the static assets (e.g. "/maps/web")
    /// * `file` - Mount-relative URL of the archive (e.g. "/maps/map/world.mbtiles")
    pub fn render_viewer(&self, root_path: &str, file: &str) -> String {
        self.template
            .replace(ROOT_PATH_PLACEHOLDER, &html_escape(root_path))
            .replace(FILE_PLACEHOLDER, &html_escape(file))
    }
}

impl Default for ViewerAssets {
    fn default() -> Self {
        Self::embedded()
    }
}
