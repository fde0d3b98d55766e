//! Coffeehouse CMS server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser / cms-cli
//!            │
//!            ▼
//!     ┌─────────────┐    ┌──────────────┐    ┌──────────────────────────┐
//!     │ http server │───▶│ admin auth   │───▶│ service                  │
//!     │ (axum)      │    │ + sessions   │    │  ├─ content validation   │
//!     └─────────────┘    └──────────────┘    │  ├─ content store (JSON) │
//!            │                               │  └─ asset manager (img)  │
//!            ▼                               └──────────────────────────┘
//!     public routes: /health, /api/content, /api/contact
//!
//!     Cross-cutting: config (+ hot reload), observability, security, lifecycle
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use coffeehouse_cms::config::{load_or_default, ConfigWatcher};
use coffeehouse_cms::lifecycle::{signals, startup};
use coffeehouse_cms::net::tls::load_tls_config;
use coffeehouse_cms::observability::{logging, metrics};
use coffeehouse_cms::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "coffeehouse-cms")]
#[command(about = "Content management backend for the coffeehouse site", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "CMS_CONFIG", default_value = "coffeehouse.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logging is not up yet, so config errors go straight to stderr.
    let config = load_or_default(&args.config)?;
    logging::init_logging(&config.observability.log_level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "coffeehouse-cms starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        content_path = %config.storage.content_path,
        upload_dir = %config.storage.upload_dir,
        tls = config.listener.tls.is_some(),
        "Configuration loaded"
    );

    startup::preflight(&config)?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watcher handle must outlive the server for events to keep flowing.
    let (config_updates, _watcher) = if args.config.exists() {
        let (watcher, rx) = ConfigWatcher::new(&args.config);
        (rx, Some(watcher.run()?))
    } else {
        let (_tx, rx) = mpsc::unbounded_channel();
        (rx, None)
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    let server = HttpServer::new(config.clone());
    match &config.listener.tls {
        Some(tls) => {
            let addr: SocketAddr = config.listener.bind_address.parse()?;
            let rustls = load_tls_config(tls).await?;
            server
                .run_tls(addr, rustls, config_updates, server_shutdown)
                .await?;
        }
        None => {
            let listener = TcpListener::bind(&config.listener.bind_address).await?;
            server.run(listener, config_updates, server_shutdown).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
