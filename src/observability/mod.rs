//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Per request (http::server):
//!     → x-request-id assigned (UUID v4) and propagated to the response
//!     → TraceLayer span around the whole request
//!
//! Consumers:
//!     → stdout or log file
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
