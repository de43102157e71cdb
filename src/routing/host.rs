//! Host key extraction and normalization.
//!
//! # Responsibilities
//! - Pull the routing host from a request (Host header, then HTTP/2 authority)
//! - Normalize configured and requested hosts to the same key
//!
//! # Design Decisions
//! - Host matching is case-insensitive (RFC 9110)
//! - Port suffix is dropped: one tenant answers on every listener port
//! - Trailing dot (fully-qualified form) is dropped
//! - Bracketed IPv6 literals keep their brackets

use axum::http::{header, Request};

/// Normalize a hostname or `host:port` authority into a registry key.
pub fn host_key(raw: &str) -> String {
    let raw = raw.trim();

    let host = if raw.starts_with('[') {
        match raw.find(']') {
            Some(end) => &raw[..=end],
            None => raw,
        }
    } else {
        match raw.rsplit_once(':') {
            // A single colon separates a port; more than one is a bare IPv6 literal.
            Some((host, port)) if !host.contains(':') && port.bytes().all(|b| b.is_ascii_digit()) => {
                host
            }
            _ => raw,
        }
    };

    host.trim_end_matches('.').to_ascii_lowercase()
}

/// The raw routing host of a request.
///
/// HTTP/1.1 carries it in the `Host` header; HTTP/2 requests may only carry
/// the `:authority` pseudo-header, which lands in the URI.
pub fn request_host<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))
        .filter(|h| !h.is_empty())
}
