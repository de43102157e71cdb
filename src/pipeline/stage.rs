//! Named middleware stages.
//!
//! A tenant's middleware is an ordered list of stages, outermost first,
//! wrapped around its handler. The list is kept on the pipeline so the order
//! can be inspected and tested instead of living in nested function calls.

use std::fmt;

use axum::http::{header, HeaderValue};
use axum::Router;
use tower_http::compression::{CompressionLayer, CompressionLevel};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Gzip response bodies.
    Compression { level: u8 },
    /// Reject request bodies above this many bytes with 413.
    BodyLimit { bytes: usize },
    /// `Cache-Control: public, max-age=N` on every response.
    CacheControl { max_age_secs: u64 },
    /// Tenant security headers.
    SecurityHeaders {
        frame_options: Option<HeaderValue>,
        hsts: Option<HeaderValue>,
    },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Compression { .. } => "compression",
            Stage::BodyLimit { .. } => "body-limit",
            Stage::CacheControl { .. } => "cache-control",
            Stage::SecurityHeaders { .. } => "security-headers",
        }
    }

    fn apply(&self, router: Router) -> Router {
        match self {
            Stage::Compression { level } => router.layer(
                CompressionLayer::new().quality(CompressionLevel::Precise(i32::from(*level))),
            ),
            Stage::BodyLimit { bytes } => router.layer(RequestBodyLimitLayer::new(*bytes)),
            Stage::CacheControl { max_age_secs } => {
                let value = HeaderValue::from_str(&format!("public, max-age={}", max_age_secs))
                    .unwrap_or_else(|_| HeaderValue::from_static("no-cache"));
                router.layer(SetResponseHeaderLayer::overriding(header::CACHE_CONTROL, value))
            }
            Stage::SecurityHeaders { frame_options, hsts } => {
                let mut router = router;
                if let Some(value) = frame_options {
                    router = router.layer(SetResponseHeaderLayer::overriding(
                        header::X_FRAME_OPTIONS,
                        value.clone(),
                    ));
                }
                if let Some(value) = hsts {
                    router = router.layer(SetResponseHeaderLayer::overriding(
                        header::STRICT_TRANSPORT_SECURITY,
                        value.clone(),
                    ));
                }
                router
            }
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Compression { level } => write!(f, "compression(gzip, level {})", level),
            Stage::BodyLimit { bytes } => write!(f, "body-limit({} bytes)", bytes),
            Stage::CacheControl { max_age_secs } => write!(f, "cache-control(max-age={})", max_age_secs),
            Stage::SecurityHeaders { .. } => f.write_str("security-headers"),
        }
    }
}

/// Wrap a handler in stages, first stage outermost.
pub(crate) fn compile(handler: Router, stages: &[Stage]) -> Router {
    stages
        .iter()
        .rev()
        .fold(handler, |router, stage| stage.apply(router))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn echo_router() -> Router {
        Router::new().fallback(|body: axum::body::Bytes| async move { body })
    }

    #[tokio::test]
    async fn body_limit_rejects_large_bodies() {
        let app = compile(echo_router(), &[Stage::BodyLimit { bytes: 8 }]);

        let small = app
            .clone()
            .oneshot(Request::post("/").body(Body::from("12345678")).unwrap())
            .await
            .unwrap();
        assert_eq!(small.status(), StatusCode::OK);

        let large = app
            .oneshot(Request::post("/").body(Body::from("123456789")).unwrap())
            .await
            .unwrap();
        assert_eq!(large.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn header_stages_set_response_headers() {
        let stages = [
            Stage::CacheControl { max_age_secs: 3600 },
            Stage::SecurityHeaders {
                frame_options: Some(HeaderValue::from_static("DENY")),
                hsts: Some(HeaderValue::from_static("max-age=600")),
            },
        ];
        let app = compile(echo_router(), &stages);

        let res = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.headers()[header::CACHE_CONTROL], "public, max-age=3600");
        assert_eq!(res.headers()[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(res.headers()[header::STRICT_TRANSPORT_SECURITY], "max-age=600");
    }

    #[test]
    fn stage_names() {
        let names: Vec<_> = [
            Stage::Compression { level: 5 },
            Stage::BodyLimit { bytes: 1 },
            Stage::CacheControl { max_age_secs: 1 },
        ]
        .iter()
        .map(Stage::name)
        .collect();
        assert_eq!(names, ["compression", "body-limit", "cache-control"]);
    }
}
