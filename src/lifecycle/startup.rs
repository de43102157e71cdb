//! Startup orchestration.
//!
//! # Responsibilities
//! - Install logging and the optional metrics exporter
//! - Compile the access filter and virtual host registry
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ConfigError, GatewayConfig};
use crate::http::{run_status, Dispatcher, HttpServer};
use crate::lifecycle::Shutdown;
use crate::net::{load_tls_config, TlsError};
use crate::observability::logging::{self, LoggingError};
use crate::observability::metrics;
use crate::pipeline::BuildError;
use crate::routing::VirtualHostRegistry;
use crate::security::{AccessFilter, CidrError};

/// Everything that can stop the gateway from coming up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("tenant pipeline error: {0}")]
    Build(#[from] BuildError),

    #[error("access filter error: {0}")]
    Access(#[from] CidrError),

    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("metrics exporter error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("{field}: invalid socket address {value:?}")]
    Address { field: &'static str, value: String },

    #[error("TLS error: {0}")]
    Tls(#[from] TlsError),

    #[error("listener error: {0}")]
    Io(#[from] io::Error),
}

/// Install the log subscriber and, when configured, the Prometheus exporter.
pub fn init_observability(config: &GatewayConfig) -> Result<(), StartupError> {
    logging::init(&config.observability)?;

    if let Some(addr) = &config.observability.metrics_address {
        let addr = parse_addr("observability.metrics_address", addr)?;
        metrics::init_metrics(addr)?;
    }
    Ok(())
}

/// A fully compiled gateway, ready to bind.
#[derive(Debug)]
pub struct Gateway {
    config: GatewayConfig,
    dispatcher: Dispatcher,
}

/// Compile the access filter and host registry from configuration.
///
/// No listener is touched; a configuration that passes here is one the
/// gateway will serve.
pub fn assemble(config: GatewayConfig) -> Result<Gateway, StartupError> {
    let filter = AccessFilter::from_config(&config.access)?;
    let registry = VirtualHostRegistry::build(&config)?;

    tracing::info!(
        tenants = registry.len(),
        status_host = %registry.status_host(),
        blocked_ranges = filter.blocked_ranges().len(),
        allowed_ranges = filter.allowed_ranges().len(),
        block_by_default = filter.block_by_default(),
        "Gateway assembled"
    );

    Ok(Gateway {
        dispatcher: Dispatcher::new(Arc::new(filter), Arc::new(registry)),
        config,
    })
}

impl Gateway {
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Bind every configured listener and serve until `shutdown` fires.
    pub async fn run(self, shutdown: &Shutdown) -> Result<(), StartupError> {
        let listener_config = &self.config.listener;

        let status_task = match &listener_config.status_bind_address {
            Some(addr) => {
                let listener = TcpListener::bind(addr).await?;
                let path = self.config.status.path.clone();
                let signal = shutdown.subscribe();
                Some(tokio::spawn(async move {
                    run_status(listener, &path, signal).await
                }))
            }
            None => None,
        };

        let server = HttpServer::new(self.dispatcher, &self.config.timeouts);
        match &listener_config.tls {
            Some(tls) => {
                let addr = parse_addr("listener.bind_address", &listener_config.bind_address)?;
                let rustls = load_tls_config(tls).await?;
                server.run_tls(addr, rustls, shutdown.subscribe()).await?;
            }
            None => {
                let listener = TcpListener::bind(&listener_config.bind_address).await?;
                server.run(listener, shutdown.subscribe()).await?;
            }
        }

        if let Some(task) = status_task {
            task.await.map_err(io::Error::other)??;
        }
        Ok(())
    }
}

fn parse_addr(field: &'static str, value: &str) -> Result<SocketAddr, StartupError> {
    value.parse().map_err(|_| StartupError::Address {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn assembles_valid_config() {
        let config = parse_config(
            r#"
            [[services]]
            name = "api"
            type = "proxy"
            ingress = "api.example.com"
            egress = "http://127.0.0.1:8080"
            "#,
        )
        .unwrap();

        let gateway = assemble(config).unwrap();
        let registry = gateway.dispatcher().registry();
        assert_eq!(registry.len(), 2);
        assert!(registry.lookup("api.example.com").is_some());
    }

    #[test]
    fn malformed_origin_is_fatal() {
        let config = parse_config(
            r#"
            [[services]]
            name = "api"
            type = "proxy"
            ingress = "api.example.com"
            egress = "not a url"
            "#,
        )
        .unwrap();

        assert!(matches!(assemble(config), Err(StartupError::Build(_))));
    }

    #[tokio::test]
    async fn status_path_with_route_syntax_assembles() {
        let config = parse_config(
            r#"
            [status]
            path = "/:health"
            "#,
        )
        .unwrap();

        let gateway = assemble(config).unwrap();
        let request = axum::http::Request::get("/:health")
            .header("host", "localhost")
            .body(axum::body::Body::empty())
            .unwrap();
        let res = gateway
            .dispatcher()
            .dispatch("192.0.2.1:4000".parse().unwrap(), request)
            .await;
        assert_eq!(res.status(), axum::http::StatusCode::OK);
    }

    #[test]
    fn malformed_cidr_is_fatal() {
        let config = parse_config(
            r#"
            [access]
            blocked = ["10.0.0.0/33"]
            "#,
        )
        .unwrap();

        assert!(matches!(assemble(config), Err(StartupError::Access(_))));
    }
}
