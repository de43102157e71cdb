//! Header manipulation and security headers.
//!
//! # Responsibilities
//! - Add X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host, X-Real-IP
//! - Strip hop-by-hop headers in both directions
//! - Build per-tenant security response headers
//!
//! # Design Decisions
//! - The gateway is the network edge: inbound X-Forwarded-* and X-Real-IP
//!   are replaced, never appended to
//! - The original Host header is forwarded to the origin unchanged

use std::net::SocketAddr;

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Who sent a request and over what. Inserted into request extensions by
/// the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientInfo {
    pub addr: SocketAddr,
    pub tls: bool,
}

impl ClientInfo {
    pub fn scheme(&self) -> &'static str {
        if self.tls {
            "https"
        } else {
            "http"
        }
    }
}

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Stamp forwarding headers describing the client.
pub fn set_forwarded(headers: &mut HeaderMap, client: &ClientInfo) {
    let ip = client.addr.ip().to_canonical().to_string();
    if let Ok(value) = HeaderValue::from_str(&ip) {
        headers.insert(X_FORWARDED_FOR, value.clone());
        headers.insert(X_REAL_IP, value);
    }
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static(client.scheme()));

    match headers.get(header::HOST).cloned() {
        Some(host) => {
            headers.insert(X_FORWARDED_HOST, host);
        }
        None => {
            headers.remove(X_FORWARDED_HOST);
        }
    }
}

/// `X-Frame-Options` value, validated.
pub fn frame_options(value: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(value.trim())
}

/// `Strict-Transport-Security` value for a max-age.
pub fn hsts(max_age_secs: u64) -> HeaderValue {
    HeaderValue::from_str(&format!("max-age={}", max_age_secs))
        .unwrap_or_else(|_| HeaderValue::from_static("max-age=0"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_hop_by_hop_and_connection_named() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-secret"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-secret", HeaderValue::from_static("1"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::ACCEPT));
    }

    #[test]
    fn forwarded_headers_replace_client_supplied_values() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("api.example.com"));
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("6.6.6.6"));

        let client = ClientInfo {
            addr: "203.0.113.9:51000".parse().unwrap(),
            tls: true,
        };
        set_forwarded(&mut headers, &client);

        assert_eq!(headers[X_FORWARDED_FOR], "203.0.113.9");
        assert_eq!(headers[X_REAL_IP], "203.0.113.9");
        assert_eq!(headers[X_FORWARDED_PROTO], "https");
        assert_eq!(headers[X_FORWARDED_HOST], "api.example.com");
    }

    #[test]
    fn security_header_values() {
        assert_eq!(hsts(31536000), "max-age=31536000");
        assert_eq!(frame_options(" SAMEORIGIN ").unwrap(), "SAMEORIGIN");
        assert!(frame_options("bad\nvalue").is_err());
    }
}
