//! Built-in configuration values.

use crate::logging::LogFormat;
use crate::mode::RpcMode;
use crate::socket::SocketEndpoint;

/// Default TCP port for single-command requests.
pub const DEFAULT_RPC_PORT: u16 = 8989;

/// Default TCP port for batch requests.
pub const DEFAULT_BATCH_PORT: u16 = 9000;

/// Handle issued to the first job admitted by a fresh server.
pub const DEFAULT_FIRST_JOB_HANDLE: u64 = 1000;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

const DEFAULT_HOST: &str = "127.0.0.1";

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default reply style of the RPC endpoint.
pub fn default_rpc_mode() -> RpcMode {
    RpcMode::Async
}

/// Default endpoint for single-command requests.
pub fn default_rpc_socket() -> SocketEndpoint {
    SocketEndpoint::tcp(DEFAULT_HOST, DEFAULT_RPC_PORT)
}

/// Default endpoint for batch requests.
pub fn default_batch_socket() -> SocketEndpoint {
    SocketEndpoint::tcp(DEFAULT_HOST, DEFAULT_BATCH_PORT)
}

/// Default handle for the first admitted job.
pub fn default_first_job_handle() -> u64 {
    DEFAULT_FIRST_JOB_HANDLE
}
