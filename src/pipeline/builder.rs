//! Tenant pipeline construction.
//!
//! Turns one service declaration into a compiled pipeline. Building parses
//! and validates everything the tenant needs (origin URL, byte sizes, header
//! values) but performs no network or filesystem I/O.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::{PipelineDefaults, ServiceConfig, ServiceTarget};
use crate::load_balancer::{Balancer, Origin, OriginError, SingleOrigin};
use crate::pipeline::proxy::{self, ProxyClient, ProxyState};
use crate::pipeline::stage::Stage;
use crate::pipeline::{static_files, status, PipelineKind, TenantPipeline};
use crate::security::headers;
use crate::security::limits::{parse_byte_size, ByteSizeError};

/// A service declaration that cannot be turned into a pipeline.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("service {service:?}: invalid origin: {source}")]
    Origin {
        service: String,
        #[source]
        source: OriginError,
    },

    #[error("service {service:?}: {source}")]
    BodyLimit {
        service: String,
        #[source]
        source: ByteSizeError,
    },

    #[error("service {service:?}: invalid frame_options header value {value:?}")]
    FrameOptions { service: String, value: String },

    #[error("host {host:?} is declared by {first:?} and {second:?} with different targets")]
    ConflictingHost {
        host: String,
        first: String,
        second: String,
    },

    #[error("service {service:?} claims reserved status host {host:?}")]
    ReservedHost { service: String, host: String },
}

/// Builds tenant pipelines from declarations.
#[derive(Clone)]
pub struct PipelineBuilder {
    defaults: PipelineDefaults,
    upstream_timeout: Duration,
    client: ProxyClient,
}

impl PipelineBuilder {
    pub fn new(defaults: PipelineDefaults, upstream_timeout: Duration) -> Self {
        Self {
            defaults,
            upstream_timeout,
            client: proxy::new_client(),
        }
    }

    /// Build the pipeline for one service.
    pub fn build(&self, service: &ServiceConfig) -> Result<TenantPipeline, BuildError> {
        let security = self.security_stage(service)?;

        match &service.target {
            ServiceTarget::Proxy { egress } => {
                let origin = Origin::parse(egress).map_err(|source| BuildError::Origin {
                    service: service.name.clone(),
                    source,
                })?;
                let bytes = self.body_limit(service, &self.defaults.proxy_body_limit)?;

                let mut stages = vec![Stage::BodyLimit { bytes }];
                stages.extend(security);

                let balancer: Arc<dyn Balancer> = Arc::new(SingleOrigin::new(origin.clone()));
                let handler = proxy::router(ProxyState {
                    tenant: Arc::from(service.name.as_str()),
                    balancer,
                    client: self.client.clone(),
                    upstream_timeout: self.upstream_timeout,
                });

                Ok(TenantPipeline::new(
                    &service.name,
                    PipelineKind::Proxy { origin },
                    stages,
                    handler,
                ))
            }
            ServiceTarget::Static {
                egress,
                index,
                cache_max_age_secs,
            } => {
                let index = index
                    .clone()
                    .unwrap_or_else(|| self.defaults.index_document.clone());
                let bytes = self.body_limit(service, &self.defaults.static_body_limit)?;
                let max_age_secs = cache_max_age_secs.unwrap_or(self.defaults.cache_max_age_secs);

                let mut stages = vec![
                    Stage::Compression {
                        level: self.defaults.compression_level,
                    },
                    Stage::BodyLimit { bytes },
                    Stage::CacheControl { max_age_secs },
                ];
                stages.extend(security);

                let handler = static_files::router(egress, &index);

                Ok(TenantPipeline::new(
                    &service.name,
                    PipelineKind::Static {
                        root: egress.clone(),
                        index,
                    },
                    stages,
                    handler,
                ))
            }
        }
    }

    /// The synthesized status tenant. It carries no stages.
    pub fn status(&self, path: &str) -> TenantPipeline {
        TenantPipeline::new("status", PipelineKind::Status, Vec::new(), status::router(path))
    }

    fn body_limit(&self, service: &ServiceConfig, default: &str) -> Result<usize, BuildError> {
        let raw = service.body_limit.as_deref().unwrap_or(default);
        parse_byte_size(raw).map_err(|source| BuildError::BodyLimit {
            service: service.name.clone(),
            source,
        })
    }

    fn security_stage(&self, service: &ServiceConfig) -> Result<Option<Stage>, BuildError> {
        let policy = &service.headers;
        if policy.is_empty() {
            return Ok(None);
        }

        let frame_options = policy
            .frame_options
            .as_deref()
            .map(|value| {
                headers::frame_options(value).map_err(|_| BuildError::FrameOptions {
                    service: service.name.clone(),
                    value: value.to_string(),
                })
            })
            .transpose()?;
        let hsts = policy.hsts_max_age.map(headers::hsts);

        Ok(Some(Stage::SecurityHeaders { frame_options, hsts }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeaderPolicy;
    use std::path::PathBuf;

    fn builder() -> PipelineBuilder {
        PipelineBuilder::new(PipelineDefaults::default(), Duration::from_secs(5))
    }

    fn service(target: ServiceTarget) -> ServiceConfig {
        ServiceConfig {
            name: "tenant".into(),
            ingress: "tenant.example.com".into(),
            target,
            headers: HeaderPolicy::default(),
            body_limit: None,
        }
    }

    #[test]
    fn proxy_pipeline_stages() {
        let pipeline = builder()
            .build(&service(ServiceTarget::Proxy {
                egress: "http://10.0.0.5:8080".into(),
            }))
            .unwrap();

        match pipeline.kind() {
            PipelineKind::Proxy { origin } => {
                assert_eq!(origin.authority().as_str(), "10.0.0.5:8080")
            }
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(
            pipeline.stages(),
            [Stage::BodyLimit {
                bytes: parse_byte_size("4T").unwrap()
            }]
        );
    }

    #[test]
    fn static_pipeline_stages_in_order() {
        let mut declaration = service(ServiceTarget::Static {
            egress: PathBuf::from("/srv/assets"),
            index: None,
            cache_max_age_secs: None,
        });
        declaration.headers.frame_options = Some("DENY".into());

        let pipeline = builder().build(&declaration).unwrap();

        let names: Vec<_> = pipeline.stages().iter().map(Stage::name).collect();
        assert_eq!(
            names,
            ["compression", "body-limit", "cache-control", "security-headers"]
        );
        assert_eq!(
            pipeline.stages()[1],
            Stage::BodyLimit {
                bytes: 10 * 1024 * 1024
            }
        );
        assert_eq!(pipeline.stages()[2], Stage::CacheControl { max_age_secs: 3600 });
        assert_eq!(
            pipeline.kind(),
            &PipelineKind::Static {
                root: PathBuf::from("/srv/assets"),
                index: "index.html".into()
            }
        );
    }

    #[test]
    fn per_service_overrides() {
        let mut declaration = service(ServiceTarget::Static {
            egress: PathBuf::from("/srv/app"),
            index: Some("app.html".into()),
            cache_max_age_secs: Some(60),
        });
        declaration.body_limit = Some("1K".into());

        let pipeline = builder().build(&declaration).unwrap();
        assert!(pipeline.stages().contains(&Stage::BodyLimit { bytes: 1024 }));
        assert!(pipeline.stages().contains(&Stage::CacheControl { max_age_secs: 60 }));
    }

    #[test]
    fn malformed_origin_fails() {
        let err = builder()
            .build(&service(ServiceTarget::Proxy {
                egress: "::not a url::".into(),
            }))
            .unwrap_err();
        assert!(matches!(err, BuildError::Origin { .. }));
    }

    #[test]
    fn bad_body_limit_fails() {
        let mut declaration = service(ServiceTarget::Proxy {
            egress: "http://10.0.0.5".into(),
        });
        declaration.body_limit = Some("lots".into());

        assert!(matches!(
            builder().build(&declaration),
            Err(BuildError::BodyLimit { .. })
        ));
    }

    #[test]
    fn bad_frame_options_fails() {
        let mut declaration = service(ServiceTarget::Proxy {
            egress: "http://10.0.0.5".into(),
        });
        declaration.headers.frame_options = Some("DENY\r\nX-Injected: 1".into());

        assert!(matches!(
            builder().build(&declaration),
            Err(BuildError::FrameOptions { .. })
        ));
    }
}
