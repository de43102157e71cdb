//! Static directory tenant.
//!
//! Files are served from the tenant root. Anything that does not resolve to
//! a file falls back to the index document (single-page-app routing), and the
//! fallback keeps a 200 status. A missing index yields 404. Path traversal
//! outside the root is rejected by `ServeDir`.

use std::path::Path;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

pub(crate) fn router(root: &Path, index: &str) -> Router {
    let fallback = ServeFile::new(root.join(index));
    let serve = ServeDir::new(root)
        .append_index_html_on_directories(true)
        .fallback(fallback);

    Router::new().fallback_service(serve)
}
