//! # Observability Infrastructure
//!
//! Structured logging for the injection plugin.

pub mod logging;

pub use logging::log_config_info;

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// Uses `log_level` as an `EnvFilter` directive and switches between pretty
/// and JSON output. Fails instead of panicking when a subscriber is already set.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    validator::Validate::validate(config).map_err(Error::from)?;

    let filter = EnvFilter::try_new(&config.log_level).map_err(|e| {
        Error::config(format!("Invalid log level '{}': {}", config.log_level, e))
    })?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json_logging {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true).with_writer(std::io::stderr)).try_init()
    };

    installed.map_err(|e| Error::config(format!("Failed to install tracing subscriber: {}", e)))?;

    tracing::debug!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        json_logging = config.json_logging,
        "Logging initialized"
    );

    Ok(())
}
