//! edge-guard
//!
//! Serves JSON functions behind a request gate and a per-caller
//! sliding-window rate limiter.
//!
//! ```text
//!   POST /functions/{endpoint}
//!        │
//!        ▼
//!   ┌──────────┐   ┌──────────────┐   ┌─────────────┐   ┌──────────┐
//!   │   CORS   │──▶│ request gate │──▶│ rate limiter│──▶│ function │──▶ 200 JSON
//!   └──────────┘   └──────┬───────┘   └──────┬──────┘   └────┬─────┘
//!     OPTIONS → 200       │ 405/400/413      │ 429           │ 500
//!                         ▼                  ▼               ▼
//!                     ┌──────────────────────────────────────────┐
//!                     │               audit sink                 │
//!                     └──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_guard::admin::setup_admin_router;
use edge_guard::config::{load_config, GuardConfig};
use edge_guard::http::HttpServer;
use edge_guard::lifecycle::{shutdown, signals, Shutdown};
use edge_guard::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "edge-guard")]
#[command(about = "Request gate and rate limiter for JSON functions")]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!("edge-guard v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_body_bytes = config.gate.max_body_bytes,
        endpoints = config.rate_limit.endpoints.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let stop = Shutdown::new();
    signals::spawn_signal_listener(stop.clone());

    let server = HttpServer::new(config.clone())?;

    if config.admin.enabled {
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        let admin_app = setup_admin_router(server.admin_state());
        let admin_shutdown = stop.subscribe();
        tracing::info!(address = %config.admin.bind_address, "Admin API listening");
        tokio::spawn(async move {
            let served = axum::serve(admin_listener, admin_app)
                .with_graceful_shutdown(shutdown::wait(admin_shutdown))
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    server.run(listener, stop.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
