//! Waiting for the request to stop.

use std::io;

use signal_hook::consts::TERM_SIGNALS;
use signal_hook::consts::signal::SIGHUP;
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Something [`run_daemon_with`](super::run_daemon_with) blocks on while serving.
pub trait ShutdownSignal: Send + Sync {
    /// Returns once the server should stop.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Failure to wait for a stop request.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Signal handlers could not be registered.
    #[error("failed to install signal handlers: {0}")]
    Install(#[source] io::Error),
}

/// Waits for `SIGTERM`, `SIGINT`, `SIGQUIT`, or `SIGHUP`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let watched = TERM_SIGNALS.iter().copied().chain([SIGHUP]);
        let mut signals = Signals::new(watched).map_err(ShutdownError::Install)?;
        let received = signals.forever().next();
        info!(target: PROCESS_TARGET, signal = ?received, "stop requested");
        Ok(())
    }
}
