//! Plane-hunting server: two players, two cross-shaped planes each, a hit
//! on the nose brings a plane down.
//!
//! ```text
//! GRIDWAR_BIND=0.0.0.0:8000   listen address
//! GRIDWAR_UNIT=plane          or ship:<length>
//! GRIDWAR_UNITS=2             units per player
//! RUST_LOG=info               log filter
//! ```

use std::env;

use gridwar::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "0.0.0.0:8000";

fn game_config_from_env() -> Result<GameConfig, Box<dyn std::error::Error>> {
    let mut config = GameConfig::default();
    if let Ok(unit) = env::var("GRIDWAR_UNIT") {
        config.unit = unit.parse()?;
    }
    if let Ok(units) = env::var("GRIDWAR_UNITS") {
        config.units_per_player = units.trim().parse()?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let bind = env::var("GRIDWAR_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let config = game_config_from_env()?;
    tracing::info!(%bind, unit = ?config.unit, units = config.units_per_player, "starting warplanes");

    let server = GridwarServer::builder()
        .bind(&bind)
        .game_config(config)
        .build()
        .await?;

    server.run().await?;
    Ok(())
}
