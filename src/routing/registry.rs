//! Virtual host registry.
//!
//! # Responsibilities
//! - Compile every service declaration into a tenant pipeline, in order
//! - Insert the synthesized status tenant under the reserved host
//! - Look up the tenant for a request host
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) host lookup via HashMap on normalized keys
//! - Any build error aborts construction: there is no partial registry
//! - Identical duplicate declarations: last one wins, with a warning

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{GatewayConfig, ServiceConfig};
use crate::config::validation::same_intent;
use crate::pipeline::{BuildError, PipelineBuilder, TenantPipeline};
use crate::routing::host::host_key;

#[derive(Debug)]
pub struct VirtualHostRegistry {
    hosts: HashMap<String, Arc<TenantPipeline>>,
    status_host: String,
}

impl VirtualHostRegistry {
    /// Build the registry from a full configuration.
    pub fn build(config: &GatewayConfig) -> Result<Self, BuildError> {
        let builder = PipelineBuilder::new(
            config.defaults.clone(),
            Duration::from_secs(config.timeouts.upstream_secs),
        );
        Self::build_with(&builder, &config.services, &config.status.host, &config.status.path)
    }

    /// Build the registry with an explicit pipeline builder.
    pub fn build_with(
        builder: &PipelineBuilder,
        services: &[ServiceConfig],
        status_host: &str,
        status_path: &str,
    ) -> Result<Self, BuildError> {
        let status_key = host_key(status_host);
        let mut hosts = HashMap::with_capacity(services.len() + 1);
        let mut declared: HashMap<String, &ServiceConfig> = HashMap::new();

        for service in services {
            let key = host_key(&service.ingress);

            if key == status_key {
                return Err(BuildError::ReservedHost {
                    service: service.name.clone(),
                    host: key,
                });
            }

            if let Some(previous) = declared.get(&key) {
                if !same_intent(previous, service) {
                    return Err(BuildError::ConflictingHost {
                        host: key,
                        first: previous.name.clone(),
                        second: service.name.clone(),
                    });
                }
                tracing::warn!(
                    host = %key,
                    previous = %previous.name,
                    service = %service.name,
                    "Host declared twice; last declaration wins"
                );
            }

            let pipeline = builder.build(service)?;
            tracing::debug!(
                host = %key,
                tenant = %pipeline.name(),
                kind = pipeline.kind().label(),
                stages = ?pipeline.stages().iter().map(|s| s.to_string()).collect::<Vec<_>>(),
                "Tenant registered"
            );

            declared.insert(key.clone(), service);
            hosts.insert(key, Arc::new(pipeline));
        }

        hosts.insert(status_key.clone(), Arc::new(builder.status(status_path)));

        Ok(Self {
            hosts,
            status_host: status_key,
        })
    }

    /// Find the tenant for a raw host value (port and case are normalized).
    pub fn lookup(&self, host: &str) -> Option<&Arc<TenantPipeline>> {
        self.hosts.get(&host_key(host))
    }

    pub fn status_host(&self) -> &str {
        &self.status_host
    }

    /// Number of registered hosts, including the status host.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.keys().map(String::as_str)
    }
}
