//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → access_control.rs (peer address vs. CIDR ranges, before routing)
//!     → [tenant pipeline]
//!         → limits.rs (body ceiling per tenant)
//!         → headers.rs (security response headers, X-Forwarded-* for origins)
//! ```
//!
//! # Design Decisions
//! - The access filter runs before host lookup and never sees header data
//! - Rejections carry generic bodies; details go to the log only

pub mod access_control;
pub mod headers;
pub mod limits;

pub use access_control::{AccessFilter, Cidr, CidrError};
pub use headers::ClientInfo;
pub use limits::{parse_byte_size, ByteSizeError};
