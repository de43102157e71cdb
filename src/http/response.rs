//! Gateway-generated responses.
//!
//! Every rejection the gateway produces itself goes through here so bodies
//! stay short and never carry internal detail (hosts, ranges, origin errors).
//! Tenant responses pass through untouched.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

fn plain(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or("Error");
    (status, reason).into_response()
}

/// Access filter rejection.
pub fn forbidden() -> Response {
    plain(StatusCode::FORBIDDEN)
}

/// No tenant for the requested host.
pub fn not_found() -> Response {
    plain(StatusCode::NOT_FOUND)
}

pub fn bad_request() -> Response {
    plain(StatusCode::BAD_REQUEST)
}

/// Origin unreachable or returned a transport error.
pub fn bad_gateway() -> Response {
    plain(StatusCode::BAD_GATEWAY)
}

/// Origin did not answer in time.
pub fn gateway_timeout() -> Response {
    plain(StatusCode::GATEWAY_TIMEOUT)
}

pub fn service_unavailable() -> Response {
    plain(StatusCode::SERVICE_UNAVAILABLE)
}

/// Handler panicked; the panic message is logged, not returned.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Request handler panicked");
    plain(StatusCode::INTERNAL_SERVER_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn bodies_are_generic() {
        let res = forbidden();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(to_bytes(res.into_body(), 64).await.unwrap(), "Forbidden");

        let res = panic_response(Box::new("secret internal state".to_string()));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            to_bytes(res.into_body(), 64).await.unwrap(),
            "Internal Server Error"
        );
    }
}
