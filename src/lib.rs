//! Multi-tenant virtual-host HTTP gateway library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod pipeline;
pub mod routing;
pub mod security;

pub use config::schema::GatewayConfig;
pub use http::{Dispatcher, HttpServer};
pub use lifecycle::{Gateway, Shutdown, StartupError};
pub use pipeline::{PipelineBuilder, Stage, TenantPipeline};
pub use routing::VirtualHostRegistry;
pub use security::AccessFilter;
