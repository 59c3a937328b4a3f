//! Maps decoded requests onto registry operations.

use std::sync::Arc;

use tracing::{debug, warn};

use jobwire_protocol::{Command, JobHandle, Operation, ProtocolError, Reply, Verb};

use crate::executor::{Job, run_inline};
use crate::operations::WorkloadCatalogue;
use crate::registry::{JobRegistry, JobStatus};

use super::DISPATCH_TARGET;

/// Immediate reply plus any job admitted while producing it.
#[derive(Debug)]
pub struct Dispatch {
    /// Line to send back to the client.
    pub reply: Reply,
    /// Job to hand to the execution backend, present only for accepted
    /// submissions.
    pub job: Option<Job>,
}

impl Dispatch {
    fn reply(reply: Reply) -> Self {
        Self { reply, job: None }
    }
}

/// Decodes requests and applies them to the job registry.
///
/// Dispatch itself never blocks on a running workload: a submission only
/// allocates a handle and wraps the operation, and a poll only peeks.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<JobRegistry>,
    catalogue: Arc<dyn WorkloadCatalogue>,
}

impl Dispatcher {
    /// Creates a dispatcher over a shared registry and workload source.
    #[must_use]
    pub fn new(registry: Arc<JobRegistry>, catalogue: Arc<dyn WorkloadCatalogue>) -> Self {
        Self {
            registry,
            catalogue,
        }
    }

    /// Decodes and dispatches one request line.
    ///
    /// Decoding failures become [`Reply::Rejected`] and never allocate a
    /// handle.
    #[must_use]
    pub fn dispatch_line(&self, line: &str) -> Dispatch {
        match Command::parse_request(line) {
            Ok(command) => self.dispatch(command),
            Err(error) => self.reject(error),
        }
    }

    /// Applies an already decoded command.
    #[must_use]
    pub fn dispatch(&self, command: Command) -> Dispatch {
        match command {
            Command::Submit(operation) => self.submit(operation),
            Command::Poll { handle } => self.poll(handle),
        }
    }

    /// Decodes one request line and answers it on the calling thread.
    ///
    /// Submissions run to completion before the reply is built and never
    /// touch the registry. Without handles there is nothing to poll, so
    /// `getResult` is an unknown method here.
    #[must_use]
    pub fn answer_line(&self, line: &str) -> Reply {
        match Command::parse_request(line) {
            Ok(Command::Submit(operation)) => self.answer(operation),
            Ok(Command::Poll { .. }) => {
                self.reject(ProtocolError::unknown_method(Verb::GetResult.as_str())).reply
            }
            Err(error) => self.reject(error).reply,
        }
    }

    fn answer(&self, operation: Operation) -> Reply {
        let verb = operation.verb();
        debug!(target: DISPATCH_TARGET, %verb, "running request inline");
        Reply::Ready(run_inline(verb, self.catalogue.prepare(operation)))
    }

    fn submit(&self, operation: Operation) -> Dispatch {
        let verb = operation.verb();
        let Ok(handle) = self.registry.allocate() else {
            return self.reject(ProtocolError::HandlesExhausted);
        };
        let workload = self.catalogue.prepare(operation);
        debug!(target: DISPATCH_TARGET, %verb, %handle, "job admitted");
        Dispatch {
            reply: Reply::Accepted(handle),
            job: Some(Job::new(handle, verb, workload)),
        }
    }

    fn poll(&self, handle: JobHandle) -> Dispatch {
        let reply = match self.registry.peek(handle) {
            JobStatus::Completed(outcome) => Reply::Ready(outcome),
            JobStatus::Pending => {
                debug!(target: DISPATCH_TARGET, %handle, "job still running");
                Reply::NotReady
            }
            JobStatus::UnknownHandle => {
                debug!(target: DISPATCH_TARGET, %handle, "poll for unknown handle");
                Reply::NotReady
            }
        };
        Dispatch::reply(reply)
    }

    fn reject(&self, error: ProtocolError) -> Dispatch {
        warn!(target: DISPATCH_TARGET, %error, "request rejected");
        Dispatch::reply(Reply::Rejected(error))
    }
}
