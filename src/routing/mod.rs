//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (Host header or HTTP/2 authority)
//!     → host.rs (normalize to a host key)
//!     → registry.rs (exact-match lookup)
//!     → Return: tenant pipeline or no match
//!
//! Registry Compilation (at startup):
//!     ServiceConfig[]
//!     → PipelineBuilder per declaration, in order
//!     → + status tenant
//!     → Freeze as immutable VirtualHostRegistry
//! ```
//!
//! # Design Decisions
//! - Compiled at startup, immutable at runtime
//! - Host only: no path-based routing
//! - Deterministic: same host always reaches the same pipeline
//! - Explicit no-match rather than a silent default tenant

pub mod host;
pub mod registry;

pub use host::{host_key, request_host};
pub use registry::VirtualHostRegistry;
