//! Process-wide `tracing` subscriber set up from [`Config`].

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;

use jobwire_config::{Config, LogFormat};

/// Format of the subscriber that won installation.
static ACTIVE_FORMAT: OnceCell<LogFormat> = OnceCell::new();

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// `log_filter` is not a valid `EnvFilter` directive list.
    #[error("invalid log filter {filter:?}: {reason}")]
    Filter {
        /// Rejected directives.
        filter: String,
        /// Parser explanation.
        reason: String,
    },
    /// Another global subscriber is already installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Installs the global subscriber the first time it is called.
///
/// Returns the format of whichever subscriber is active; later calls leave
/// the first installation in place whatever their `config` says.
///
/// # Errors
///
/// Fails when the filter does not parse or a foreign subscriber is present.
pub fn initialise(config: &Config) -> Result<LogFormat, TelemetryError> {
    ACTIVE_FORMAT
        .get_or_try_init(|| -> Result<LogFormat, TelemetryError> {
            tracing::subscriber::set_global_default(subscriber_for(config)?)?;
            Ok(config.log_format())
        })
        .copied()
}

/// Builds, without installing, the subscriber `config` describes.
///
/// Events go to stderr with RFC 3339 UTC timestamps and thread names. ANSI
/// colour is enabled only when stderr is a terminal.
fn subscriber_for(config: &Config) -> Result<Box<dyn Subscriber + Send + Sync>, TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter()).map_err(|error| TelemetryError::Filter {
        filter: config.log_filter().to_owned(),
        reason: error.to_string(),
    })?;
    let base = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339())
        .with_thread_names(true);

    Ok(match config.log_format() {
        LogFormat::Json => Box::new(base.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(base.compact().finish()),
    })
}
