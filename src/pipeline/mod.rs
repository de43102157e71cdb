//! Tenant pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! ServiceConfig (proxy | static)
//!     → builder.rs (validate, pick stages)
//!     → stage.rs (compile stages around the handler, outermost first)
//!     → proxy.rs / static_files.rs / status.rs (terminal handler)
//!     → TenantPipeline (immutable, owned by one registry entry)
//! ```
//!
//! # Design Decisions
//! - Service type is a closed enum; there is no runtime fallback branch
//! - Every tenant gets its own compiled service; no per-request state is shared
//! - Stage order is data on the pipeline, not implicit call nesting

pub mod builder;
pub mod proxy;
pub mod stage;
pub mod static_files;
pub mod status;

use std::convert::Infallible;
use std::path::PathBuf;

use axum::{body::Body, http::Request, response::Response, Router};
use tower::ServiceExt;

use crate::load_balancer::Origin;

pub use builder::{BuildError, PipelineBuilder};
pub use stage::Stage;

/// What a tenant does with its requests.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineKind {
    Proxy { origin: Origin },
    Static { root: PathBuf, index: String },
    Status,
}

impl PipelineKind {
    pub fn label(&self) -> &'static str {
        match self {
            PipelineKind::Proxy { .. } => "proxy",
            PipelineKind::Static { .. } => "static",
            PipelineKind::Status => "status",
        }
    }
}

/// One tenant's compiled request-handling pipeline.
#[derive(Debug)]
pub struct TenantPipeline {
    name: String,
    kind: PipelineKind,
    stages: Vec<Stage>,
    service: Router,
}

impl TenantPipeline {
    pub(crate) fn new(name: &str, kind: PipelineKind, stages: Vec<Stage>, handler: Router) -> Self {
        let service = stage::compile(handler, &stages);
        Self {
            name: name.to_string(),
            kind,
            stages,
            service,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &PipelineKind {
        &self.kind
    }

    /// Stages wrapped around the handler, outermost first.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run a request through this tenant.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        self.service
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|never: Infallible| match never {})
    }
}
