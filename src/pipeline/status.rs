//! Synthesized liveness tenant.
//!
//! The configured path is compared literally against the request path, so
//! characters that mean something to axum's route syntax (`:`, `*`, `{`)
//! are plain text here.

use std::sync::Arc;

use axum::{
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;

use crate::http::response;

/// Router answering `path` with the liveness payload; every other path is 404.
pub fn router(path: &str) -> Router {
    let path: Arc<str> = Arc::from(path);
    Router::new().fallback(move |method: Method, uri: Uri| {
        let path = path.clone();
        async move { status(&path, &method, &uri) }
    })
}

fn status(path: &str, method: &Method, uri: &Uri) -> Response {
    if uri.path() != path {
        return response::not_found();
    }
    if *method != Method::GET && *method != Method::HEAD {
        return (StatusCode::METHOD_NOT_ALLOWED, [(header::ALLOW, "GET, HEAD")]).into_response();
    }
    Json(json!({ "success": "ok" })).into_response()
}
