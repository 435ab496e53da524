//! Duelforge server binary.
//!
//! Reads the bind address from `DUELFORGE_ADDR` (default `0.0.0.0:9527`)
//! and the log filter from `RUST_LOG` (default `info`), then runs the
//! server until the process is terminated.

use duelforge::{DuelforgeError, DuelforgeServer, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), DuelforgeError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let bind_addr = std::env::var("DUELFORGE_ADDR")
        .unwrap_or_else(|_| ServerConfig::default().bind_addr);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        %bind_addr,
        "starting duelforge server"
    );

    let server = DuelforgeServer::builder().bind(&bind_addr).build().await?;
    server.run().await
}
