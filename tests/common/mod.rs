//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Request, Uri},
    response::Response,
    Router,
};
use tokio::net::TcpListener;

use vhost_gateway::config::{parse_config, GatewayConfig};
use vhost_gateway::lifecycle::assemble;
use vhost_gateway::Dispatcher;

/// Start a mock origin on an ephemeral port.
///
/// Every request is answered with one line describing what the origin saw:
/// `<tag> <method> <path?query> host=<host> xff=<x-forwarded-for> proto=<x-forwarded-proto>`.
pub async fn start_mock_origin(tag: &'static str) -> SocketAddr {
    let app = Router::new().fallback(move |method: axum::http::Method, uri: Uri, headers: HeaderMap| async move {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string()
        };
        format!(
            "{} {} {} host={} xff={} proto={}",
            tag,
            method,
            uri.path_and_query().map(|p| p.as_str()).unwrap_or("/"),
            header("host"),
            header("x-forwarded-for"),
            header("x-forwarded-proto"),
        )
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An origin that accepts connections and never answers.
pub async fn start_stalled_origin() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Create a static site root with an index and one asset.
pub fn static_site(dir: &Path, label: &str) {
    std::fs::write(dir.join("index.html"), format!("<h1>{}</h1>", label)).unwrap();
    std::fs::write(dir.join("logo.png"), format!("PNG-{}", label)).unwrap();
}

/// Parse a TOML snippet into a validated configuration.
pub fn config(toml: &str) -> GatewayConfig {
    parse_config(toml).unwrap()
}

/// Compile a dispatcher straight from configuration text.
pub fn dispatcher(toml: &str) -> Dispatcher {
    assemble(config(toml)).unwrap().dispatcher().clone()
}

pub fn get(host: &str, path: &str) -> Request<Body> {
    Request::get(path)
        .header("host", host)
        .body(Body::empty())
        .unwrap()
}

pub fn peer(ip: &str) -> SocketAddr {
    SocketAddr::new(ip.parse().unwrap(), 40000)
}

pub async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
