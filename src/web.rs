#![cfg(not(tarpaulin_include))]

use delivery_verification::app;
use delivery_verification::config::AppConfig;

/// Main entry point for the delivery verification server
///
/// Reads configuration from the environment (and `.env` when present),
/// initialises logging and serves the HTTP API until the process is stopped.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    let default_level = if config.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    log::info!(
        "Serving sheet '{}' of spreadsheet {}",
        config.sheet_name,
        config.spreadsheet_id
    );
    app::run(config).await
}
