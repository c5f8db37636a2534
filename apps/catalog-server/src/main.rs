//! REST API server for the data file catalog.
//!
//! Opens the snapshot store, wires the catalog to the HTTP router and serves
//! until Ctrl+C.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use catalog_api::{Router, Server};
use catalog_core::config::CatalogConfig;
use catalog_core::ownership::OwnerOnly;
use catalog_core::store::MemoryStore;
use catalog_core::{Catalog, StoreError};
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the catalog server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Data directory for the catalog snapshot
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Keep the catalog in memory only
    #[arg(long)]
    in_memory: bool,

    /// Request body read timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    request_timeout_ms: u64,

    /// Allow layout changes on the same file to run concurrently
    #[arg(long)]
    no_layout_lock: bool,
}

impl Args {
    fn config(&self) -> CatalogConfig {
        CatalogConfig {
            data_dir: self.data_dir.clone(),
            persist: !self.in_memory,
            request_timeout_ms: self.request_timeout_ms,
            serialize_layout_changes: !self.no_layout_lock,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = args.config();
    let store = match MemoryStore::open(&config) {
        Ok(store) => store,
        Err(StoreError::Corrupt(msg)) => {
            tracing::error!("Snapshot corruption detected: {}", msg);
            tracing::error!("Catalog cannot start. Please restore the snapshot from backup.");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to open catalog store"),
    };
    if !store.is_persistent() {
        tracing::warn!("Running without persistence; all changes are lost on exit");
    }
    if !config.serialize_layout_changes {
        tracing::warn!("Per-file layout lock disabled; concurrent resizes may interleave");
    }

    let catalog = Arc::new(Catalog::new(Arc::new(store), Arc::new(OwnerOnly), config));
    let router = Router::new(catalog);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;
    let server = Server::new(addr, router);

    server
        .serve(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Received Ctrl+C, shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}
