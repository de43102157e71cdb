//! Multi-tenant virtual-host gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────┐
//!                          │                     GATEWAY                      │
//!                          │                                                  │
//!     Client Request       │  ┌──────────┐   ┌────────────┐   ┌────────────┐  │
//!     ─────────────────────┼─▶│ listener │──▶│   access   │──▶│virtual host│  │
//!                          │  │(TLS opt.)│   │   filter   │   │  registry  │  │
//!                          │  └──────────┘   └─────┬──────┘   └─────┬──────┘  │
//!                          │                   403 │                │ 404     │
//!                          │                       ▼                ▼         │
//!                          │                 ┌───────────────────────────┐    │
//!     Client Response      │                 │ tenant pipeline (stages)  │    │
//!     ◀────────────────────┼─────────────────│ proxy │ static │ status   │────┼──▶ Origin
//!                          │                 └───────────────────────────┘    │
//!                          └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use vhost_gateway::config::load_config;
use vhost_gateway::lifecycle::{self, Shutdown};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "vhost-gateway", version, about = "Multi-tenant virtual-host HTTP gateway")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        short,
        long,
        env = "GATEWAY_CONFIG",
        default_value = "/etc/vhost-gateway/gateway.toml"
    )]
    config: PathBuf,

    /// Validate the configuration and build every tenant, then exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("vhost-gateway: {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = lifecycle::init_observability(&config) {
        eprintln!("vhost-gateway: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        services = config.services.len(),
        "vhost-gateway starting"
    );

    let grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);
    let gateway = match lifecycle::assemble(config) {
        Ok(gateway) => gateway,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    if cli.check {
        tracing::info!("Configuration OK");
        return ExitCode::SUCCESS;
    }

    let shutdown = Shutdown::new(grace);
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        lifecycle::wait_for_signal().await;
        trigger.trigger();
    });

    match gateway.run(&shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Gateway stopped with error");
            ExitCode::FAILURE
        }
    }
}
