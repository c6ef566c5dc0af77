//! Transform proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────────┐
//!                   │                   TRANSFORM PROXY                    │
//!   Client Request  │  ┌──────────┐   ┌──────────┐   ┌──────────────────┐  │
//!   ────────────────┼─▶│ net      │──▶│ http     │──▶│ routing          │  │
//!   (plain or TLS)  │  │ listener │   │ server   │   │ resolve + method │  │
//!                   │  └──────────┘   └──────────┘   └────────┬─────────┘  │
//!                   │                                         ▼            │
//!                   │                                ┌──────────────────┐  │
//!                   │                                │ transform/params │  │
//!                   │                                └────────┬─────────┘  │
//!                   │                                         ▼            │
//!   Client Response │  ┌───────────────────┐         ┌──────────────────┐  │
//!   ◀───────────────┼──│ transform/headers │◀────────│ http upstream    │◀─┼── Upstream
//!                   │  └───────────────────┘         └──────────────────┘  │
//!                   └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use transform_proxy::config::{loader::DEFAULT_CONFIG_PATH, ConfigSource};
use transform_proxy::observability::{init_logging, metrics};
use transform_proxy::{HttpServer, Listeners, Shutdown};

#[derive(Parser)]
#[command(name = "transform-proxy")]
#[command(
    about = "Reverse proxy that rewrites methods, bodies and headers per route",
    long_about = None
)]
struct Cli {
    /// Configuration file (JSON, or TOML with a .toml extension)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let source = ConfigSource::new(cli.config);
    let config = source.load()?;

    init_logging(&config);
    tracing::info!(
        config = %source.path().display(),
        target_url = %config.target_url,
        listening_port = %config.listening_port,
        tls = config.active_tls().is_some(),
        routes = config.routes.len(),
        "Configuration loaded"
    );

    if cli.check {
        return Ok(());
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listeners = Listeners::bind(&config).await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let server = HttpServer::new(config);
    server.run(listeners, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
