//! Request dispatcher.
//!
//! # Responsibilities
//! - Run the access filter on the peer address
//! - Resolve the request host to a tenant
//! - Hand the request to the tenant and return its response verbatim
//!
//! # Design Decisions
//! - The filter runs before any header is looked at
//! - The dispatcher holds only shared references to immutable state, so
//!   concurrent requests never coordinate with each other

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
};

use crate::http::response;
use crate::observability::metrics;
use crate::routing::{request_host, VirtualHostRegistry};
use crate::security::{AccessFilter, ClientInfo};

/// Entry point shared by every connection.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    filter: Arc<AccessFilter>,
    registry: Arc<VirtualHostRegistry>,
    tls: bool,
}

impl Dispatcher {
    pub fn new(filter: Arc<AccessFilter>, registry: Arc<VirtualHostRegistry>) -> Self {
        Self {
            filter,
            registry,
            tls: false,
        }
    }

    /// Mark requests as arriving over TLS (affects X-Forwarded-Proto).
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn filter(&self) -> &AccessFilter {
        &self.filter
    }

    pub fn registry(&self) -> &VirtualHostRegistry {
        &self.registry
    }

    /// Process one request from `peer`.
    pub async fn dispatch(&self, peer: SocketAddr, mut request: Request<Body>) -> Response {
        let start = Instant::now();

        if self.filter.is_blocked(peer.ip()) {
            tracing::warn!(
                peer = %peer.ip(),
                host = request_host(&request).unwrap_or("-"),
                path = %request.uri().path(),
                "Blocked by access filter"
            );
            metrics::record_blocked();
            return response::forbidden();
        }

        let Some(host) = request_host(&request).map(str::to_owned) else {
            tracing::warn!(peer = %peer.ip(), "Request without host");
            metrics::record_unmatched_host();
            return response::not_found();
        };

        let Some(tenant) = self.registry.lookup(&host) else {
            tracing::warn!(host = %host, peer = %peer.ip(), "Resource not found for host");
            metrics::record_unmatched_host();
            return response::not_found();
        };

        request.extensions_mut().insert(ClientInfo {
            addr: peer,
            tls: self.tls,
        });
        let method = request.method().clone();

        let response = tenant.handle(request).await;

        tracing::debug!(
            tenant = %tenant.name(),
            host = %host,
            status = response.status().as_u16(),
            "Request handled"
        );
        metrics::record_request(tenant.name(), method.as_str(), response.status().as_u16(), start);
        response
    }
}

/// Axum handler mounted as the listener's only route.
pub async fn dispatch_handler(
    State(dispatcher): State<Dispatcher>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    dispatcher.dispatch(peer, request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccessConfig, GatewayConfig};
    use axum::http::StatusCode;

    fn dispatcher(blocked: &[&str]) -> Dispatcher {
        let config = GatewayConfig::default();
        let filter = AccessFilter::from_config(&AccessConfig {
            block_by_default: false,
            blocked: blocked.iter().map(|s| s.to_string()).collect(),
            allowed: vec![],
        })
        .unwrap();
        let registry = VirtualHostRegistry::build(&config).unwrap();
        Dispatcher::new(Arc::new(filter), Arc::new(registry))
    }

    fn request(host: Option<&str>, path: &str) -> Request<Body> {
        let mut builder = Request::get(path);
        if let Some(host) = host {
            builder = builder.header("host", host);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn status_host_answers() {
        let d = dispatcher(&[]);
        let res = d
            .dispatch("192.0.2.1:4000".parse().unwrap(), request(Some("localhost:9000"), "/status"))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn blocked_peer_is_rejected_even_for_known_host() {
        let d = dispatcher(&["104.244.100.0/24"]);
        let res = d
            .dispatch("104.244.100.7:4000".parse().unwrap(), request(Some("localhost"), "/status"))
            .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = d
            .dispatch("104.244.101.7:4000".parse().unwrap(), request(Some("localhost"), "/status"))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_or_missing_host_is_not_found() {
        let d = dispatcher(&[]);
        let peer: SocketAddr = "192.0.2.1:4000".parse().unwrap();

        let res = d.dispatch(peer, request(Some("nobody.example.com"), "/")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = d.dispatch(peer, request(None, "/")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
