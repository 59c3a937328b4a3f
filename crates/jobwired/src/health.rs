//! Lifecycle notifications emitted while the server starts and stops.

use std::sync::Arc;

use tracing::{error, info};

use jobwire_config::Config;

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Milestones a running server passes through, in order.
#[derive(Debug, Clone, Copy)]
pub enum Lifecycle<'a> {
    /// Configuration is about to be loaded.
    BootstrapStarting,
    /// Configuration, telemetry, and socket directories are in place.
    BootstrapSucceeded(&'a Config),
    /// Bootstrap stopped at the given stage.
    BootstrapFailed(&'a BootstrapError),
    /// Both listeners accept connections.
    ListenersReady(&'a Config),
    /// A shutdown request arrived.
    ShutdownStarted,
}

impl Lifecycle<'_> {
    /// Stable snake_case name used as the `event` log field.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BootstrapStarting => "bootstrap_starting",
            Self::BootstrapSucceeded(_) => "bootstrap_succeeded",
            Self::BootstrapFailed(_) => "bootstrap_failed",
            Self::ListenersReady(_) => "listeners_ready",
            Self::ShutdownStarted => "shutdown_started",
        }
    }
}

/// Receives [`Lifecycle`] milestones.
pub trait HealthReporter: Send + Sync {
    /// Called once per milestone, on the thread driving the server.
    fn report(&self, event: Lifecycle<'_>);
}

impl<T: HealthReporter + ?Sized> HealthReporter for Arc<T> {
    fn report(&self, event: Lifecycle<'_>) {
        T::report(self, event);
    }
}

/// Writes each milestone as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds the reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn report(&self, event: Lifecycle<'_>) {
        let name = event.name();
        match event {
            Lifecycle::BootstrapStarting => {
                info!(target: HEALTH_TARGET, event = name, "bootstrapping");
            }
            Lifecycle::BootstrapSucceeded(config) => info!(
                target: HEALTH_TARGET,
                event = name,
                rpc_socket = %config.rpc_socket(),
                rpc_mode = %config.rpc_mode(),
                batch_socket = %config.batch_socket(),
                first_job_handle = config.first_job_handle(),
                retained_outcomes = ?config.retained_outcomes(),
                log_format = ?config.log_format(),
                "configuration resolved"
            ),
            Lifecycle::BootstrapFailed(failure) => {
                error!(target: HEALTH_TARGET, event = name, error = %failure, "bootstrap failed");
            }
            Lifecycle::ListenersReady(config) => info!(
                target: HEALTH_TARGET,
                event = name,
                rpc_socket = %config.rpc_socket(),
                batch_socket = %config.batch_socket(),
                "ready"
            ),
            Lifecycle::ShutdownStarted => {
                info!(target: HEALTH_TARGET, event = name, "shutting down");
            }
        }
    }
}
