//! Shared configuration for the jobwire server and client.
//!
//! Values are layered by `ortho_config`: built-in defaults, then a TOML file
//! (`--config-path` or `JOBWIRE_CONFIG_PATH`), then `JOBWIRE_*` environment
//! variables, then command-line flags. Both binaries load the same structure
//! so the client always targets the endpoints the server binds.

mod defaults;
mod logging;
mod mode;
mod socket;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_BATCH_PORT, DEFAULT_FIRST_JOB_HANDLE, DEFAULT_LOG_FILTER, DEFAULT_RPC_PORT,
    default_batch_socket, default_first_job_handle, default_log_filter,
    default_log_filter_string, default_log_format, default_rpc_mode, default_rpc_socket,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use mode::{RpcMode, RpcModeParseError};
pub use socket::{EndpointProblem, SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved configuration shared by `jobwired` and `jobwire`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, OrthoConfig)]
#[ortho_config(prefix = "JOBWIRE")]
pub struct Config {
    /// Endpoint serving single-command requests.
    #[serde(default = "default_rpc_socket")]
    #[ortho_config(default = default_rpc_socket())]
    pub rpc_socket: SocketEndpoint,
    /// Whether the RPC endpoint acknowledges submissions or answers them
    /// inline.
    #[serde(default = "default_rpc_mode")]
    #[ortho_config(default = default_rpc_mode())]
    pub rpc_mode: RpcMode,
    /// Endpoint serving batch requests.
    #[serde(default = "default_batch_socket")]
    #[ortho_config(default = default_batch_socket())]
    pub batch_socket: SocketEndpoint,
    /// Handle issued to the first admitted job.
    #[serde(default = "default_first_job_handle")]
    #[ortho_config(default = DEFAULT_FIRST_JOB_HANDLE)]
    pub first_job_handle: u64,
    /// Completed outcomes kept before the oldest is evicted; zero keeps all.
    #[serde(default)]
    #[ortho_config(default = 0)]
    pub retained_outcomes: usize,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_socket: default_rpc_socket(),
            rpc_mode: default_rpc_mode(),
            batch_socket: default_batch_socket(),
            first_job_handle: default_first_job_handle(),
            retained_outcomes: 0,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Endpoint serving single-command requests.
    #[must_use]
    pub fn rpc_socket(&self) -> &SocketEndpoint {
        &self.rpc_socket
    }

    /// Reply style of the RPC endpoint.
    #[must_use]
    pub fn rpc_mode(&self) -> RpcMode {
        self.rpc_mode
    }

    /// Endpoint serving batch requests.
    #[must_use]
    pub fn batch_socket(&self) -> &SocketEndpoint {
        &self.batch_socket
    }

    /// Handle issued to the first admitted job.
    #[must_use]
    pub fn first_job_handle(&self) -> u64 {
        self.first_job_handle
    }

    /// Completed-outcome retention bound; `None` keeps every outcome.
    #[must_use]
    pub fn retained_outcomes(&self) -> Option<usize> {
        (self.retained_outcomes > 0).then_some(self.retained_outcomes)
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
