//! Origin selection for proxy tenants.
//!
//! # Data Flow
//! ```text
//! Proxy tenant receives request
//!     → Balancer::next_origin()
//!     → origin.rs (rewrite URI onto the chosen origin)
//!     → forward
//! ```
//!
//! # Design Decisions
//! - Each proxy tenant owns its balancer; nothing is shared between tenants
//! - Tenants declare one origin today (`SingleOrigin`); a multi-origin
//!   strategy slots in behind the same trait without touching the registry

use std::fmt::Debug;

pub mod origin;

pub use origin::{Origin, OriginError};

/// Trait for picking the origin that serves the next request.
pub trait Balancer: Send + Sync + Debug {
    /// Returns the origin to forward to, or None if none is available.
    fn next_origin(&self) -> Option<&Origin>;

    /// Every origin this balancer may return.
    fn origins(&self) -> &[Origin];
}

/// Always forwards to the one declared origin.
#[derive(Debug, Clone)]
pub struct SingleOrigin {
    origin: [Origin; 1],
}

impl SingleOrigin {
    pub fn new(origin: Origin) -> Self {
        Self { origin: [origin] }
    }
}

impl Balancer for SingleOrigin {
    fn next_origin(&self) -> Option<&Origin> {
        self.origin.first()
    }

    fn origins(&self) -> &[Origin] {
        &self.origin
    }
}
