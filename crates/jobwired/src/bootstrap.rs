//! Steps that turn configuration sources into a ready-to-serve [`Daemon`].

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use jobwire_config::{Config, SocketPreparationError};

use crate::health::{HealthReporter, Lifecycle};
use crate::server::{Server, ServerError, Services};
use crate::telemetry::{self, TelemetryError};

/// Source of the resolved server configuration.
pub trait ConfigLoader: Send + Sync {
    /// Produces the configuration to run with.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Reads defaults, the configuration file, `JOBWIRE_*` variables, and the
/// process arguments.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        <Config as OrthoConfig>::load()
    }
}

/// An already resolved configuration loads as itself.
impl ConfigLoader for Config {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.clone())
    }
}

/// The bootstrap stage that failed.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// No usable configuration could be resolved.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Loader failure.
        #[source]
        source: Arc<OrthoError>,
    },
    /// The tracing subscriber could not be installed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Subscriber failure.
        #[from]
        source: TelemetryError,
    },
    /// A Unix socket's parent directory could not be created.
    #[error("failed to prepare socket directory: {source}")]
    Socket {
        /// Filesystem failure.
        #[from]
        source: SocketPreparationError,
    },
}

/// A bootstrapped server that has not yet bound its listeners.
pub struct Daemon {
    config: Config,
    reporter: Arc<dyn HealthReporter>,
}

impl Daemon {
    /// Configuration the daemon will serve.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Forwards a milestone to the reporter given to [`bootstrap_with`].
    pub fn report(&self, event: Lifecycle<'_>) {
        self.reporter.report(event);
    }

    /// Binds both listeners and reports readiness.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when either endpoint cannot be served.
    pub fn serve(&self, services: Services) -> Result<Server, ServerError> {
        let server = Server::start(&self.config, services)?;
        self.report(Lifecycle::ListenersReady(&self.config));
        Ok(server)
    }
}

/// Loads configuration, installs telemetry, and creates socket directories.
///
/// `reporter` hears [`Lifecycle::BootstrapStarting`] first and then exactly
/// one of [`Lifecycle::BootstrapSucceeded`] or [`Lifecycle::BootstrapFailed`].
///
/// # Errors
///
/// Returns the [`BootstrapError`] of the first stage that fails.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    reporter.report(Lifecycle::BootstrapStarting);
    match prepare(loader) {
        Ok(config) => {
            reporter.report(Lifecycle::BootstrapSucceeded(&config));
            Ok(Daemon { config, reporter })
        }
        Err(error) => {
            reporter.report(Lifecycle::BootstrapFailed(&error));
            Err(error)
        }
    }
}

fn prepare(loader: &dyn ConfigLoader) -> Result<Config, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    telemetry::initialise(&config)?;
    config.rpc_socket().prepare_filesystem()?;
    config.batch_socket().prepare_filesystem()?;
    Ok(config)
}
