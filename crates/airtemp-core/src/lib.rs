pub mod accessory;
pub mod app;
pub mod config;
pub mod error;

pub use accessory::{Accessory, AccessoryContext, ServiceKind};
pub use app::App;
pub use config::{Config, HostConfig, SensorConfig, ValidationResult};
pub use error::{AppError, ConfigError};

use anyhow::Result;

/// Initialize logging for the host process
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("airtemp core initialized");
    Ok(())
}
