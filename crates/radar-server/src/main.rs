//! Radar Server - multi-airport traffic simulation for radar clients

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use radar_server::{server, Config, JsonAirportLoader, ServerState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("radar_server=debug".parse()?))
        .init();

    tracing::info!("Starting Radar Server...");

    let config = Config::from_env();
    let port = config.server_port;
    let loader = Arc::new(JsonAirportLoader::new(&config.airport_dir));
    let state = Arc::new(ServerState::new(config, loader)?);
    tracing::info!(airports = ?state.pool.available(), "Airports available");

    let listener = server::bind(port).await?;
    server::serve(listener, state).await;

    Ok(())
}
