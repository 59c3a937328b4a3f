//! Foreground run of the server from bootstrap to shutdown.

use std::sync::Arc;

use tracing::info;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, Lifecycle, StructuredHealthReporter};
use crate::server::Services;

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Serves with process arguments, structured health logs, and OS signals.
///
/// # Errors
///
/// See [`run_daemon_with`].
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        &SystemShutdownSignal,
    )
}

/// Bootstraps, serves until `shutdown` returns, then stops both listeners.
///
/// The listeners are stopped even when waiting on `shutdown` fails; that
/// failure is reported afterwards.
///
/// # Errors
///
/// Returns [`LaunchError`] for the first of bootstrap, listener, or signal
/// failures.
pub fn run_daemon_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    let daemon = bootstrap_with(loader, reporter)?;
    let server = daemon.serve(Services::standard(daemon.config()))?;

    let signalled = shutdown.wait();
    daemon.report(Lifecycle::ShutdownStarted);
    server.shutdown()?;
    signalled?;

    info!(target: PROCESS_TARGET, "exited cleanly");
    Ok(())
}
