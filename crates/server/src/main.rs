//! floorview relay: push channel only, no HTTP API or viewer assets.

use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("floorview relay v{}", env!("CARGO_PKG_VERSION"));

    let config = server::Config::load()?;
    info!("Loaded configuration");
    info!("  Listen: {}:{}", config.server.bind, config.server.port);
    info!("  Floor plan: {}", config.floorplan.path.display());

    server::run(config).await
}
