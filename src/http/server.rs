//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the dispatcher in the per-request middleware stack
//!   (request ID, tracing, panic capture, request deadline)
//! - Serve plain HTTP or TLS on the main listener
//! - Serve the status path on the optional secondary listener
//! - Drain in-flight requests on shutdown, then force-close after the grace period
//!
//! Every listener is driven by axum-server so shutdown has one shape: the
//! accept loop stops, idle keep-alive connections close, and connections
//! still busy when the grace period ends are dropped.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::TimeoutConfig;
use crate::http::dispatcher::{dispatch_handler, Dispatcher};
use crate::http::response;
use crate::lifecycle::ShutdownSignal;
use crate::pipeline::status;

/// HTTP front door for all tenants.
pub struct HttpServer {
    dispatcher: Dispatcher,
    request_timeout: Duration,
}

impl HttpServer {
    pub fn new(dispatcher: Dispatcher, timeouts: &TimeoutConfig) -> Self {
        Self {
            dispatcher,
            request_timeout: Duration::from_secs(timeouts.request_secs),
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn app(&self) -> Router {
        let router = Router::new()
            .fallback(dispatch_handler)
            .with_state(self.dispatcher.clone());
        with_middleware(router, self.request_timeout)
    }

    /// Run the server on a bound plain-HTTP listener until shutdown.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownSignal) -> io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            tenants = self.dispatcher.registry().len(),
            "HTTP server starting"
        );

        axum_server::from_tcp(listener.into_std()?)
            .handle(drain_on(shutdown))
            .serve(self.app().into_make_service_with_connect_info::<SocketAddr>())
            .await?;

        tracing::info!(address = %addr, "HTTP server stopped");
        Ok(())
    }

    /// Run the server with TLS termination until shutdown.
    pub async fn run_tls(
        mut self,
        addr: SocketAddr,
        tls: RustlsConfig,
        shutdown: ShutdownSignal,
    ) -> io::Result<()> {
        self.dispatcher = self.dispatcher.with_tls(true);
        tracing::info!(
            address = %addr,
            tenants = self.dispatcher.registry().len(),
            "HTTPS server starting"
        );

        axum_server::bind_rustls(addr, tls)
            .handle(drain_on(shutdown))
            .serve(self.app().into_make_service_with_connect_info::<SocketAddr>())
            .await?;

        tracing::info!(address = %addr, "HTTPS server stopped");
        Ok(())
    }
}

/// Per-request middleware shared by the plain and TLS listeners.
///
/// Layers listed last run first: the request ID is assigned before the
/// trace span opens, so every log line of the request carries it.
#[allow(deprecated)]
fn with_middleware(router: Router, request_timeout: Duration) -> Router {
    router
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CatchPanicLayer::custom(response::panic_response))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Serve only the status path on its own listener. Host and peer are ignored.
pub async fn run_status(
    listener: TcpListener,
    path: &str,
    shutdown: ShutdownSignal,
) -> io::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, path = %path, "Status listener starting");

    let app = status::router(path).layer(TraceLayer::new_for_http());
    axum_server::from_tcp(listener.into_std()?)
        .handle(drain_on(shutdown))
        .serve(app.into_make_service())
        .await
}

/// Server handle that, once `shutdown` fires, stops accepting and gives
/// open connections the signal's grace period. Connections still open
/// after that are closed.
fn drain_on(shutdown: ShutdownSignal) -> Handle {
    let handle = Handle::new();
    let grace = shutdown.grace();
    let watcher = handle.clone();
    tokio::spawn(async move {
        // The handle only wakes an accept loop that is already running.
        if watcher.listening().await.is_none() {
            return;
        }
        shutdown.recv().await;
        tracing::info!(
            grace_secs = grace.as_secs_f64(),
            connections = watcher.connection_count(),
            "Draining connections"
        );
        watcher.graceful_shutdown(Some(grace));
    });
    handle
}
