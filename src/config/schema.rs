//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS, status port).
    pub listener: ListenerConfig,

    /// Synthesized status tenant.
    pub status: StatusConfig,

    /// CIDR access filter.
    pub access: AccessConfig,

    /// Pipeline defaults applied when a service does not override them.
    pub defaults: PipelineDefaults,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Tenant declarations, in registration order.
    pub services: Vec<ServiceConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:9000").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Optional plain-HTTP listener that only answers the status path.
    pub status_bind_address: Option<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9000".to_string(),
            tls: None,
            status_bind_address: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

/// Status tenant configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Reserved hostname answering the liveness payload.
    pub host: String,

    /// Path of the liveness endpoint.
    pub path: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            path: "/status".to_string(),
        }
    }
}

/// Access filter configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AccessConfig {
    /// Block addresses that match no configured range.
    pub block_by_default: bool,

    /// Blocked CIDR ranges (IPv4 and IPv6 mixed).
    pub blocked: Vec<String>,

    /// Ranges that are always admitted, checked before `blocked`.
    pub allowed: Vec<String>,
}

/// Defaults used by the tenant pipeline builder.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineDefaults {
    /// Request body ceiling for static tenants.
    pub static_body_limit: String,

    /// Request body ceiling for proxy tenants.
    pub proxy_body_limit: String,

    /// `max-age` of the cache-control directive on static responses.
    pub cache_max_age_secs: u64,

    /// Gzip level for static responses (1-9).
    pub compression_level: u8,

    /// Index document served for directories and unmatched paths.
    pub index_document: String,
}

impl Default for PipelineDefaults {
    fn default() -> Self {
        Self {
            static_body_limit: "10M".to_string(),
            proxy_body_limit: "4T".to_string(),
            cache_max_age_secs: 3600,
            compression_level: 5,
            index_document: "index.html".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Outbound origin call timeout in seconds.
    pub upstream_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 60,
            upstream_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Append logs to this file instead of stdout.
    pub log_file: Option<PathBuf>,

    /// Prometheus scrape endpoint bind address; disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            log_file: None,
            metrics_address: None,
        }
    }
}

/// One tenant declaration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Tenant identifier for logging/metrics.
    pub name: String,

    /// Host header value that selects this tenant.
    pub ingress: String,

    /// What the tenant does with a request.
    #[serde(flatten)]
    pub target: ServiceTarget,

    /// Response header policy.
    #[serde(default)]
    pub headers: HeaderPolicy,

    /// Overrides the kind-specific default body ceiling (e.g. "25M").
    #[serde(default)]
    pub body_limit: Option<String>,
}

impl ServiceConfig {
    /// Short label for the service type, as written in config.
    pub fn kind(&self) -> &'static str {
        match self.target {
            ServiceTarget::Proxy { .. } => "proxy",
            ServiceTarget::Static { .. } => "static",
        }
    }
}

/// Service type and its egress target.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServiceTarget {
    /// Forward every request to a single origin.
    Proxy {
        /// Absolute origin URL.
        egress: String,
    },
    /// Serve a directory tree.
    Static {
        /// Filesystem root.
        egress: PathBuf,

        /// Index document override.
        #[serde(default)]
        index: Option<String>,

        /// Cache-control `max-age` override.
        #[serde(default)]
        cache_max_age_secs: Option<u64>,
    },
}

/// Optional security headers set on every tenant response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HeaderPolicy {
    /// `X-Frame-Options` value (DENY, SAMEORIGIN, ALLOW-FROM ...).
    pub frame_options: Option<String>,

    /// `Strict-Transport-Security` max-age in seconds.
    pub hsts_max_age: Option<u64>,
}

impl HeaderPolicy {
    pub fn is_empty(&self) -> bool {
        self.frame_options.is_none() && self.hsts_max_age.is_none()
    }
}
