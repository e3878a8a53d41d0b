pub mod app;
pub mod config;
pub mod error;
pub mod validation;

pub use app::App;
pub use config::{
    CalendarConfig, Config, DatabaseConfig, FinanceConfig, LoggingConfig, WeekStart,
};
pub use error::{AppError, ConfigError, DatabaseError, RusqliteErrorExt};
pub use validation::{FieldError, ValidationErrors};

use anyhow::Result;

/// Default tracing filter when neither `RUST_LOG` nor config provide one.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Initialize logging.
///
/// `RUST_LOG` wins over `filter`; `filter` wins over [`DEFAULT_LOG_FILTER`].
pub fn init(filter: Option<&str>) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(filter.unwrap_or(DEFAULT_LOG_FILTER)))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!("OrbitOS core initialized");
    Ok(())
}
