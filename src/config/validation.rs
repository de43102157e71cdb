//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect hostnames claimed by conflicting declarations
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - CIDR entries, origin URLs and byte sizes are checked where they are
//!   compiled (access filter, pipeline builder)

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::http::uri::PathAndQuery;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, ServiceConfig};
use crate::routing::host::host_key;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must not be empty")]
    Empty { field: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("status.path must be a literal path starting with '/' and without query or fragment (got {0:?})")]
    StatusPath(String),

    #[error("defaults.compression_level must be between 1 and 9 (got {0})")]
    CompressionLevel(u8),

    #[error("service {service:?} claims reserved status host {host:?}")]
    StatusHostClaimed { service: String, host: String },

    #[error("host {host:?} is declared by {first:?} and {second:?} with different targets")]
    ConflictingHost {
        host: String,
        first: String,
        second: String,
    },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if let Some(addr) = &config.listener.status_bind_address {
        check_address(&mut errors, "listener.status_bind_address", addr);
    }
    if let Some(addr) = &config.observability.metrics_address {
        check_address(&mut errors, "observability.metrics_address", addr);
    }

    let status_key = host_key(&config.status.host);
    if status_key.is_empty() {
        errors.push(ValidationError::Empty {
            field: "status.host".into(),
        });
    }
    if !is_literal_path(&config.status.path) {
        errors.push(ValidationError::StatusPath(config.status.path.clone()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "timeouts.request_secs",
        });
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "timeouts.upstream_secs",
        });
    }
    if !(1..=9).contains(&config.defaults.compression_level) {
        errors.push(ValidationError::CompressionLevel(
            config.defaults.compression_level,
        ));
    }
    if config.defaults.index_document.is_empty() {
        errors.push(ValidationError::Empty {
            field: "defaults.index_document".into(),
        });
    }

    let mut claimed: HashMap<String, &ServiceConfig> = HashMap::new();
    for (i, service) in config.services.iter().enumerate() {
        if service.name.trim().is_empty() {
            errors.push(ValidationError::Empty {
                field: format!("services[{}].name", i),
            });
        }

        let key = host_key(&service.ingress);
        if key.is_empty() {
            errors.push(ValidationError::Empty {
                field: format!("services[{}].ingress", i),
            });
            continue;
        }

        if key == status_key {
            errors.push(ValidationError::StatusHostClaimed {
                service: service.name.clone(),
                host: key,
            });
            continue;
        }

        match claimed.get(&key) {
            Some(previous) if !same_intent(previous, service) => {
                errors.push(ValidationError::ConflictingHost {
                    host: key,
                    first: previous.name.clone(),
                    second: service.name.clone(),
                });
            }
            _ => {
                claimed.insert(key, service);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Two declarations for one host agree if everything but the name matches.
pub(crate) fn same_intent(a: &ServiceConfig, b: &ServiceConfig) -> bool {
    a.target == b.target && a.headers == b.headers && a.body_limit == b.body_limit
}

/// An origin-form path the request URI can be compared against verbatim.
fn is_literal_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.contains(['?', '#'])
        && path.parse::<PathAndQuery>().is_ok()
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{HeaderPolicy, ServiceTarget};

    fn proxy(name: &str, ingress: &str, egress: &str) -> ServiceConfig {
        ServiceConfig {
            name: name.into(),
            ingress: ingress.into(),
            target: ServiceTarget::Proxy {
                egress: egress.into(),
            },
            headers: HeaderPolicy::default(),
            body_limit: None,
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.status.path = "status".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn status_path_must_be_literal() {
        let mut config = GatewayConfig::default();

        for path in ["/status?check=1", "/status#top", "/has space"] {
            config.status.path = path.into();
            assert_eq!(
                validate_config(&config),
                Err(vec![ValidationError::StatusPath(path.into())]),
                "{}",
                path
            );
        }

        // Router syntax is just text here; matching is literal.
        for path in ["/:health", "/*rest", "/{id}"] {
            config.status.path = path.into();
            assert_eq!(validate_config(&config), Ok(()), "{}", path);
        }
    }

    #[test]
    fn conflicting_duplicate_host_is_rejected() {
        let mut config = GatewayConfig::default();
        config.services.push(proxy("a", "api.example.com", "http://10.0.0.1"));
        config.services.push(proxy("b", "API.example.com:443", "http://10.0.0.2"));

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            &errors[0],
            ValidationError::ConflictingHost { host, .. } if host == "api.example.com"
        ));
    }

    #[test]
    fn identical_duplicate_host_is_tolerated() {
        let mut config = GatewayConfig::default();
        config.services.push(proxy("a", "api.example.com", "http://10.0.0.1"));
        config.services.push(proxy("a-again", "api.example.com", "http://10.0.0.1"));

        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn status_host_is_reserved() {
        let mut config = GatewayConfig::default();
        config.services.push(proxy("sneaky", "localhost:9000", "http://10.0.0.1"));

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::StatusHostClaimed { .. }));
    }
}
