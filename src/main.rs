//! Dialogues microservice.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                 DIALOGUES SERVICE                     │
//!                    │                                                       │
//!   Client Request   │  ┌──────────┐   ┌─────────────┐   ┌──────────────┐   │
//!   ─────────────────┼─▶│  http    │──▶│ request_log │──▶│  handlers    │   │
//!                    │  │ server   │   │ middleware  │   │              │   │
//!                    │  └──────────┘   └──────┬──────┘   └──┬────────┬──┘   │
//!                    │                        │             │        │      │
//!                    │                        ▼             ▼        ▼      │
//!                    │                 ┌────────────┐ ┌────────┐ ┌───────┐  │
//!                    │                 │  LogSink   │ │ store  │◀│ tasks │  │
//!                    │                 └─────┬──────┘ └───┬────┘ └───────┘  │
//!                    │                       │            │                 │
//!                    └───────────────────────┼────────────┼─────────────────┘
//!                                            ▼            ▼
//!                                       logs table   dialogues table
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use dialogues_service::config::load_config;
use dialogues_service::http::HttpServer;
use dialogues_service::lifecycle::{signals, Shutdown};
use dialogues_service::observability::{logging, metrics};
use dialogues_service::store;

#[derive(Parser)]
#[command(name = "dialogues-service")]
#[command(about = "HTTP service for dialogue records", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults plus DIALOGUES_* env vars are used without one.
    #[arg(short, long, env = "DIALOGUES_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init(&config.observability);

    tracing::info!("dialogues-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        write_delay_ms = config.tasks.write_delay_ms,
        request_log_sink = ?config.request_log.sink,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let pool = store::connect(&config.database).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    signals::forward_signals(&shutdown);

    let server = HttpServer::new(config, pool.clone());
    server.run(listener, shutdown.subscribe()).await?;

    pool.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
