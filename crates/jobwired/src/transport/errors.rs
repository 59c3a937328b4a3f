//! Error types for socket transport operations.

use std::io;

use thiserror::Error;

/// Errors surfaced while binding or running a socket listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The TCP host name could not be resolved.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        /// Endpoint being bound.
        endpoint: String,
        /// Resolver failure.
        #[source]
        source: io::Error,
    },
    /// The TCP host resolved to no addresses.
    #[error("{endpoint} did not resolve to any address")]
    NoAddress {
        /// Endpoint being bound.
        endpoint: String,
    },
    /// The operating system refused the bind.
    #[error("failed to bind {endpoint}: {source}")]
    Bind {
        /// Endpoint being bound.
        endpoint: String,
        /// Bind failure.
        #[source]
        source: io::Error,
    },
    /// A live process already answers on the Unix socket path.
    #[error("{endpoint} is already served by another process")]
    InUse {
        /// Endpoint being bound.
        endpoint: String,
    },
    /// Something other than a socket occupies the Unix socket path.
    #[error("refusing to replace {path}: not a socket")]
    NotASocket {
        /// Occupied path.
        path: String,
    },
    /// A leftover Unix socket file could not be inspected or removed.
    #[error("failed to reclaim stale socket {path}: {source}")]
    StaleSocket {
        /// Socket path.
        path: String,
        /// Filesystem or connection failure.
        #[source]
        source: io::Error,
    },
    /// The bound socket could not be switched to non-blocking mode.
    #[error("failed to configure {endpoint}: {source}")]
    Configure {
        /// Endpoint being served.
        endpoint: String,
        /// Socket option failure.
        #[source]
        source: io::Error,
    },
    /// The accept thread could not be created.
    #[error("failed to spawn {role} listener thread: {source}")]
    Spawn {
        /// `rpc` or `batch`.
        role: &'static str,
        /// Thread creation failure.
        #[source]
        source: io::Error,
    },
    /// Unix sockets are unavailable on this platform.
    #[cfg(not(unix))]
    #[error("unix sockets are unsupported for endpoint {endpoint}")]
    UnsupportedUnix {
        /// Requested endpoint.
        endpoint: String,
    },
    /// The accept thread panicked.
    #[error("{role} listener thread panicked")]
    Panicked {
        /// `rpc` or `batch`.
        role: &'static str,
    },
}

/// Errors raised while reading a request from an accepted connection.
#[derive(Debug, Error)]
pub(crate) enum TransportError {
    /// The peer sent more than the handler accepts.
    #[error("request exceeds {limit} byte limit")]
    TooLarge { limit: usize },
    /// The socket failed mid-read.
    #[error("failed to read request: {0}")]
    Io(#[from] io::Error),
}
