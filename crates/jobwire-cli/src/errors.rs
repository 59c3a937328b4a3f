//! Error types for the client library and the CLI runtime.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use jobwire_protocol::JobHandle;

/// Failures raised while exchanging requests with the server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The TCP host could not be resolved.
    #[error("failed to resolve server address {endpoint}: {source}")]
    Resolve {
        /// Endpoint as configured.
        endpoint: String,
        /// Resolver failure.
        source: io::Error,
    },
    /// The server did not accept the connection.
    #[error("failed to connect to server at {endpoint}: {source}")]
    Connect {
        /// Endpoint as configured.
        endpoint: String,
        /// Connection failure.
        source: io::Error,
    },
    /// Unix sockets are unavailable on this platform.
    #[cfg(not(unix))]
    #[error("platform does not support Unix sockets: {0}")]
    UnsupportedUnixTransport(String),
    /// Writing the request failed.
    #[error("failed to send request to server: {0}")]
    SendRequest(#[source] io::Error),
    /// Reading the reply failed.
    #[error("failed to read reply from server: {0}")]
    ReadReply(#[source] io::Error),
    /// The server closed the connection without answering.
    #[error("server closed the connection without a reply")]
    MissingReply,
    /// The reply did not have the expected shape.
    #[error("unexpected reply from server: {line}")]
    UnexpectedReply {
        /// Reply line as received.
        line: String,
    },
    /// The server refused the request.
    #[error("server rejected the request: {message}")]
    Rejected {
        /// Error text from the reply, without the `ERROR - ` prefix.
        message: String,
    },
    /// A batch `sort` carried no values; its body line could not be decoded.
    #[error("batch sort operations need at least one value")]
    EmptySort,
    /// Polling gave up before the job finished.
    #[error("job {handle} was not ready after {attempts} polls")]
    NotReady {
        /// Handle being polled.
        handle: JobHandle,
        /// Number of polls made.
        attempts: u32,
    },
}

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to read batch lines from stdin: {0}")]
    ReadInput(io::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
    #[error("job {handle} failed: {outcome}")]
    JobFailed { handle: JobHandle, outcome: String },
}
