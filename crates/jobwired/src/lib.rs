//! Asynchronous job server speaking the jobwire line protocol.
//!
//! `jobwired` listens on two endpoints. The RPC endpoint takes one request per
//! connection: submissions (`foo`, `add`, `sort`) are acknowledged straight
//! away with a job handle while the work runs on its own thread, and
//! `getResult <handle>` later returns the stored outcome or `NOT_READY`. With
//! `rpc_mode = "sync"` the same endpoint instead runs each submission before
//! replying and answers with its outcome. The batch endpoint takes a `REQUEST: BATCH` block of operations, runs them in
//! order, and answers with one line per operation.
//!
//! The moving parts mirror that flow:
//!
//! - [`JobRegistry`] issues handles and stores outcomes.
//! - [`Dispatcher`] turns a decoded request into a reply and, for
//!   submissions, a [`Job`].
//! - [`ExecutionBackend`] runs jobs; [`ThreadBackend`] spawns one thread each.
//! - [`BatchProcessor`] drives the batch state machine.
//! - [`Server`] binds both listeners; [`run_daemon`] adds bootstrap,
//!   telemetry, and signal handling for the binary.

mod batch;
mod bootstrap;
mod dispatch;
mod executor;
mod health;
mod operations;
mod process;
mod registry;
mod server;
pub mod telemetry;
mod transport;

pub use batch::{
    BATCH_HEADER, BATCH_SENTINEL, BatchProcessor, BatchReply, BatchState, NOT_A_BATCH,
    execute_line,
};
pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, SystemConfigLoader, bootstrap_with,
};
pub use dispatch::{Dispatch, Dispatcher};
pub use executor::{
    ExecutionBackend, Job, ThreadBackend, Workload, WorkloadError, failure_outcome, run_inline,
};
pub use health::{HealthReporter, Lifecycle, StructuredHealthReporter};
pub use operations::{
    Evaluation, StandardCatalogue, WorkloadCatalogue, count_to, evaluate, format_values,
};
pub use process::{
    LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon, run_daemon_with,
};
pub use registry::{JobRegistry, JobStatus, RegistryError};
pub use server::{Server, ServerError, Services};
pub use telemetry::TelemetryError;
pub use transport::ListenerError;

#[cfg(test)]
mod tests;
