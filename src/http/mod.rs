//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID, tracing, deadline, panic capture)
//!     → dispatcher.rs (access filter → host lookup → tenant pipeline)
//!     → response.rs (gateway-generated rejections)
//!     → Send to client
//! ```

pub mod dispatcher;
pub mod response;
pub mod server;

pub use dispatcher::{dispatch_handler, Dispatcher};
pub use server::{run_status, HttpServer};
