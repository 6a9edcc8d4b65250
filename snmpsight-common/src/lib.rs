//! snmpsight common library
//!
//! Shared types and utilities for the SNMP-to-Zenoh bridge:
//!
//! - [`telemetry`] - Decoded sensor values and the reading envelope (`DecodedValue`, `SensorReading`)
//! - [`serialization`] - Raw/JSON/CBOR payload encoding
//! - [`config`] - Zenoh and logging settings
//! - [`session`] - Zenoh session management
//! - [`keyexpr`] - Topic (key expression) builders
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod keyexpr;
pub mod serialization;
pub mod session;
pub mod telemetry;

// Re-export commonly used types at the crate root
pub use config::{LogFormat, LoggingConfig, ZenohConfig, ZenohMode};
pub use error::{Error, Result};
pub use keyexpr::{KEY_PREFIX, TopicBuilder, slugify};
pub use serialization::{Format, encode_reading};
pub use session::connect;
pub use telemetry::{DecodedValue, SensorReading, current_timestamp_millis};

/// Initialize tracing with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level when set.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);
    let initialized = match config.format {
        LogFormat::Text => registry.with(fmt::layer()).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    };

    initialized.map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))
}
