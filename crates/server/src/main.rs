//! Serpent Royale game server.

use tracing::info;
use tracing_subscriber::EnvFilter;

mod arena;
mod collision;
mod config;
mod entity;
mod math;
mod server;
mod world;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Serpent Royale Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = config::Config::load()?;
    info!("Loaded configuration");
    info!("  Port: {}", config.server.port);
    info!("  Arena radius: {}", config.arena.initial_radius);
    info!("  Tick interval: {}ms", config.server.tick_interval_ms);

    // Start the game server
    server::run(config).await?;

    Ok(())
}
