pub mod config;
pub mod error;

pub use config::{
    Config, ConfigIssue, ConfigReport, DatabaseConfig, HomeLocation, RemindersConfig,
    WeatherConfig, DEFAULT_WEATHER_BASE_URL, WEATHER_API_KEY_ENV,
};
pub use error::{
    AppError, ConfigError, DatabaseError, NetworkError, ReqwestErrorExt, RusqliteErrorExt,
    WeatherError,
};

use anyhow::Result;

/// Initialize the core application
pub fn init() -> Result<()> {
    // RUST_LOG wins; otherwise info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("Sprout core initialized");
    Ok(())
}
