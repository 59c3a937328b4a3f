//! Asynchronous execution of admitted jobs.
//!
//! The dispatcher turns each submission into a [`Job`]: a handle paired with a
//! boxed [`Workload`]. An [`ExecutionBackend`] runs the job away from the
//! connection thread and publishes the outcome into the
//! [`JobRegistry`](crate::JobRegistry). The production backend spawns one
//! thread per job; tests substitute their own implementations to control when
//! work finishes.

mod thread;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::{debug, warn};

use jobwire_protocol::{ERROR_PREFIX, JobHandle, Verb};

use crate::registry::JobRegistry;

pub use self::thread::ThreadBackend;

pub(crate) const EXECUTOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::executor");

/// Deferred unit of work producing the outcome text for a job.
pub type Workload = Box<dyn FnOnce() -> Result<String, WorkloadError> + Send + 'static>;

/// Failure reported by a workload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkloadError {
    /// Checked integer arithmetic overflowed.
    #[error("arithmetic overflow")]
    Overflow,
    /// The workload failed for another reason.
    #[error("{message}")]
    Failed {
        /// Human-readable failure description.
        message: String,
    },
}

impl WorkloadError {
    /// Builds a [`WorkloadError::Failed`] from any message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Admitted job awaiting execution.
pub struct Job {
    handle: JobHandle,
    verb: Verb,
    workload: Workload,
}

impl Job {
    /// Pairs a freshly issued handle with the work it stands for.
    #[must_use]
    pub fn new(handle: JobHandle, verb: Verb, workload: Workload) -> Self {
        Self {
            handle,
            verb,
            workload,
        }
    }

    /// Handle the outcome will be stored under.
    #[must_use]
    pub fn handle(&self) -> JobHandle {
        self.handle
    }

    /// Verb that produced the job.
    #[must_use]
    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Runs the workload on the current thread and returns the outcome text.
    ///
    /// Failures and panics become an `ERROR - <verb> failed: <detail>` outcome
    /// so pollers always receive a terminal answer.
    #[must_use]
    pub fn run(self) -> String {
        let Self {
            handle,
            verb,
            workload,
        } = self;
        attempt(workload).unwrap_or_else(|detail| {
            warn!(target: EXECUTOR_TARGET, %handle, %verb, %detail, "job failed");
            failure_outcome(verb, detail)
        })
    }

    /// Runs the job and stores its outcome in `registry`.
    pub fn run_into(self, registry: &JobRegistry) {
        let handle = self.handle;
        let verb = self.verb;
        debug!(target: EXECUTOR_TARGET, %handle, %verb, "job started");
        let outcome = self.run();
        publish(registry, handle, outcome);
        debug!(target: EXECUTOR_TARGET, %handle, %verb, "job finished");
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Job")
            .field("handle", &self.handle)
            .field("verb", &self.verb)
            .finish_non_exhaustive()
    }
}

/// Runs admitted jobs off the connection thread.
///
/// Implementations must eventually store exactly one outcome for every job
/// they accept, even when the workload fails.
pub trait ExecutionBackend: Send + Sync {
    /// Takes ownership of a job and arranges for it to run.
    fn submit(&self, job: Job);
}

/// Outcome text stored when a job cannot produce its result.
#[must_use]
pub fn failure_outcome(verb: Verb, detail: impl fmt::Display) -> String {
    format!("{ERROR_PREFIX}{verb} failed: {detail}")
}

/// Runs `workload` on the calling thread without a handle.
///
/// Failures and panics render exactly as they would for a polled job.
#[must_use]
pub fn run_inline(verb: Verb, workload: Workload) -> String {
    attempt(workload).unwrap_or_else(|detail| {
        warn!(target: EXECUTOR_TARGET, %verb, %detail, "inline request failed");
        failure_outcome(verb, detail)
    })
}

fn attempt(workload: Workload) -> Result<String, String> {
    match panic::catch_unwind(AssertUnwindSafe(workload)) {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(error)) => Err(error.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

pub(crate) fn publish(registry: &JobRegistry, handle: JobHandle, outcome: String) {
    if let Err(error) = registry.complete(handle, outcome) {
        warn!(
            target: EXECUTOR_TARGET,
            %handle,
            %error,
            "job outcome discarded"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "workload panicked".to_owned()
    }
}
