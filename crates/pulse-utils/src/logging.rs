//! Logging and tracing utilities

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Read the format from `PULSE_LOG_FORMAT` (`json` or anything else)
    pub fn from_env() -> Self {
        match std::env::var("PULSE_LOG_FORMAT") {
            Ok(value) => Self::parse(&value),
            Err(_) => Self::Pretty,
        }
    }

    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Initialize tracing subscriber with default configuration
///
/// Honors `RUST_LOG` (falls back to `info`) and `PULSE_LOG_FORMAT`.
pub fn init_tracing() {
    init_tracing_with(LogFormat::from_env(), "info");
}

/// Initialize tracing with an explicit format and fallback filter directive
pub fn init_tracing_with(format: LogFormat, default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}
