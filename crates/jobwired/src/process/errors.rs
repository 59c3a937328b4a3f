//! Why a foreground run ended early.

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::server::ServerError;

use super::shutdown::ShutdownError;

/// First failure met by [`run_daemon_with`](super::run_daemon_with).
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration, telemetry, or socket directories were unusable.
    #[error(transparent)]
    Bootstrap {
        /// Failed stage.
        #[from]
        source: BootstrapError,
    },
    /// A listener would not start or its thread panicked on the way down.
    #[error(transparent)]
    Server {
        /// Listener failure.
        #[from]
        source: ServerError,
    },
    /// The stop request could not be awaited.
    #[error(transparent)]
    Shutdown {
        /// Signal handling failure.
        #[from]
        source: ShutdownError,
    },
}
