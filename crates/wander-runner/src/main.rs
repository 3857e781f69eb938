//! Patrol runner for the Wander engine.
//!
//! Wires configuration, the species catalog, and a session connector into
//! a [`Supervisor`] and runs it until it stops.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `wander.yaml` (or `WANDER_CONFIG`)
//! 3. Load the species catalog, if configured
//! 4. Open the offline world around the start coordinate
//! 5. Run the supervisor
//! 6. Log the result and export the route when `WANDER_EXPORT_ROUTE` is set
//!
//! [`Supervisor`]: wander_core::supervisor::Supervisor

mod error;

use std::path::{Path, PathBuf};

use tracing::info;
use tracing_subscriber::EnvFilter;
use wander_core::catalog::StaticCatalog;
use wander_core::config::BotConfig;
use wander_core::offline::OfflineConnector;
use wander_core::supervisor::{self, Supervisor};

use crate::error::RunnerError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG: &str = "wander.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, catalog loading, or the route export
/// fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("wander starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        start = %config.route.start,
        locations = config.route.locations.len(),
        max_gap_m = config.route.max_gap_m,
        capture = config.capture.enabled,
        strongholds = config.landmarks.strongholds.enabled,
        "Configuration loaded"
    );

    // 3. Load the species catalog.
    let catalog = match &config.catalog.species_file {
        Some(path) => {
            let catalog = StaticCatalog::from_file(path)?;
            info!(species = catalog.len(), path = %path.display(), "Species catalog loaded");
            catalog
        }
        None => StaticCatalog::default(),
    };

    // 4. Open the offline world.
    let seed = config.pacing.seed.unwrap_or_else(rand::random);
    let connector = OfflineConnector::new(seed, config.route.start);
    info!(seed, "Offline world opened");

    // 5. Run the supervisor.
    let mut supervisor = Supervisor::new(connector, config, Box::new(catalog))
        .map_err(RunnerError::from)?;
    let result = supervisor.run().await;

    // 6. Log results.
    supervisor::log_run_end(&result);
    if let Some(path) = std::env::var_os("WANDER_EXPORT_ROUTE").map(PathBuf::from) {
        export_route(&supervisor, &path)?;
    }

    info!(reason = ?result.stop_reason, "wander shutdown complete");
    Ok(())
}

/// Load configuration from `WANDER_CONFIG` or `wander.yaml`.
///
/// A missing file yields defaults with environment overrides applied.
fn load_config() -> Result<BotConfig, RunnerError> {
    let config_path = std::env::var_os("WANDER_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    if config_path.exists() {
        Ok(BotConfig::from_file(&config_path)?)
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
        let mut config = BotConfig::default();
        config.account.apply_env_overrides();
        Ok(config)
    }
}

/// Write the planned route as `lat,lon,label` lines.
fn export_route<K>(supervisor: &Supervisor<K>, path: &Path) -> Result<(), RunnerError>
where
    K: wander_core::session::Connector,
{
    let Some(route) = supervisor.route() else {
        info!("No route was planned, nothing to export");
        return Ok(());
    };
    std::fs::write(path, route.to_csv())?;
    info!(path = %path.display(), waypoints = route.len(), "Route exported");
    Ok(())
}
