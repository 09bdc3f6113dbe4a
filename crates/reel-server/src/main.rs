//! Catalog server binary.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `reel-config.yaml` (or `REEL_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Connect the `PostgreSQL` pool and run migrations
//! 4. Build the catalog state and serve until `Ctrl-C`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reel_db::PostgresPool;
use reel_server::{AppState, LogFormat, ReelConfig, start_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "reel-config.yaml";

/// Application entry point for the catalog server.
///
/// # Errors
///
/// Returns an error if configuration, database setup or the server fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = std::env::var_os("REEL_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_tracing(&config);
    info!(
        config = %config_path.display(),
        host = config.server.host,
        port = config.server.port,
        "reel-server starting"
    );

    // 3. Connect to PostgreSQL.
    let pool = PostgresPool::open(&config.database).await?;

    // 4. Serve.
    let state = Arc::new(AppState::new(
        pool.catalog(),
        config.import.settings(),
        config.import.default_user.clone(),
    ));
    let served = start_server(&config.server.to_server_config(), state).await;

    pool.close().await;
    served?;

    info!("reel-server shutdown complete");
    Ok(())
}

/// Load configuration, falling back to defaults plus environment overrides
/// when the file does not exist.
fn load_config(path: &Path) -> Result<ReelConfig, reel_server::ConfigError> {
    if path.exists() {
        ReelConfig::from_file(path)
    } else {
        let mut config = ReelConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }
}

fn init_tracing(config: &ReelConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
