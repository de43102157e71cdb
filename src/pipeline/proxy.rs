//! Reverse-proxy handler.
//!
//! Forwards every method, path and query to the tenant's origin and streams
//! the origin response back. The outbound call is owned by the request
//! future: if the client goes away or the request deadline fires, the future
//! is dropped and the origin call is cancelled with it.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, Version},
    response::Response,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::http::response;
use crate::load_balancer::Balancer;
use crate::security::headers::{self, ClientInfo};

/// Outbound HTTP client shared by the proxy tenants of one registry.
pub type ProxyClient = Client<HttpConnector, Body>;

pub fn new_client() -> ProxyClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

#[derive(Clone)]
pub(crate) struct ProxyState {
    pub tenant: Arc<str>,
    pub balancer: Arc<dyn Balancer>,
    pub client: ProxyClient,
    pub upstream_timeout: Duration,
}

pub(crate) fn router(state: ProxyState) -> Router {
    Router::new().fallback(forward).with_state(state)
}

async fn forward(State(state): State<ProxyState>, request: Request<Body>) -> Response {
    let Some(origin) = state.balancer.next_origin() else {
        tracing::warn!(tenant = %state.tenant, "No origin available");
        return response::service_unavailable();
    };

    let (mut parts, body) = request.into_parts();

    // HTTP/2 clients carry the host in `:authority` only; the origin still needs it.
    if !parts.headers.contains_key(header::HOST) {
        let authority = parts.uri.authority().map(|a| HeaderValue::from_str(a.as_str()));
        if let Some(Ok(host)) = authority {
            parts.headers.insert(header::HOST, host);
        }
    }

    parts.uri = match origin.rewrite(&parts.uri) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(tenant = %state.tenant, uri = %parts.uri, error = %e, "Cannot map request onto origin");
            return response::bad_request();
        }
    };
    // The outbound connection negotiates its own protocol.
    parts.version = Version::HTTP_11;

    headers::strip_hop_by_hop(&mut parts.headers);
    if let Some(client) = parts.extensions.get::<ClientInfo>().copied() {
        headers::set_forwarded(&mut parts.headers, &client);
    }

    tracing::debug!(
        tenant = %state.tenant,
        method = %parts.method,
        uri = %parts.uri,
        "Forwarding to origin"
    );

    let outbound = Request::from_parts(parts, body);
    match tokio::time::timeout(state.upstream_timeout, state.client.request(outbound)).await {
        Ok(Ok(upstream)) => {
            let (mut parts, body) = upstream.into_parts();
            headers::strip_hop_by_hop(&mut parts.headers);
            Response::from_parts(parts, Body::new(body))
        }
        Ok(Err(e)) => {
            tracing::error!(tenant = %state.tenant, origin = %origin, error = %e, "Origin request failed");
            response::bad_gateway()
        }
        Err(_) => {
            tracing::error!(
                tenant = %state.tenant,
                origin = %origin,
                timeout_secs = state.upstream_timeout.as_secs(),
                "Origin request timed out"
            );
            response::gateway_timeout()
        }
    }
}
