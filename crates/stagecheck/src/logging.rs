//! Tracing setup for the Lambda binary.
//!
//! Lambda forwards stderr to CloudWatch Logs, so every format writes there
//! without ANSI colors.

use std::io;

use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable selecting the log format.
pub const ENV_LOG_FORMAT: &str = "STAGECHECK_LOG_FORMAT";

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "stagecheck=info,stagecheck_core=info,stagecheck_aws=info";

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line, queryable with Logs Insights
    #[default]
    Json,
    /// Compact single-line format
    Compact,
    /// Pretty-printed multi-line format, for local runs
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            _ => Err(format!("Unknown log format: {s}")),
        }
    }
}

impl LogFormat {
    /// Read the format from [`ENV_LOG_FORMAT`], defaulting to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable holds an unknown format.
    pub fn from_env() -> miette::Result<Self> {
        match std::env::var(ENV_LOG_FORMAT) {
            Ok(value) if !value.is_empty() => value
                .parse()
                .map_err(|e: String| miette::miette!("{}: {}", ENV_LOG_FORMAT, e)),
            _ => Ok(Self::default()),
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if `RUST_LOG` holds an invalid filter.
pub fn init_tracing(format: LogFormat) -> miette::Result<()> {
    let env_filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(filter) if !filter.is_empty() => EnvFilter::try_new(filter),
        _ => EnvFilter::try_new(DEFAULT_FILTER),
    }
    .map_err(|e| miette::miette!("Failed to create tracing filter: {e}"))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_span_list(false)
                .without_time();

            registry.with(layer).init();
        }
        LogFormat::Compact => {
            let layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(io::stderr)
                .with_ansi(false)
                .with_target(false)
                .without_time();

            registry.with(layer).init();
        }
        LogFormat::Pretty => {
            let layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(io::stderr)
                .with_target(true);

            registry.with(layer).init();
        }
    }

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        ?format,
        "Tracing initialized"
    );

    Ok(())
}
