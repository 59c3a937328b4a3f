//! Thread-per-job execution backend.

use std::sync::Arc;
use std::thread;

use tracing::error;

use crate::registry::JobRegistry;

use super::{EXECUTOR_TARGET, ExecutionBackend, Job, failure_outcome, publish};

/// Runs every job on its own detached OS thread.
///
/// Jobs never wait for one another, so a long counting loop cannot delay an
/// addition submitted after it.
#[derive(Debug, Clone)]
pub struct ThreadBackend {
    registry: Arc<JobRegistry>,
}

impl ThreadBackend {
    /// Creates a backend that publishes outcomes into `registry`.
    #[must_use]
    pub fn new(registry: Arc<JobRegistry>) -> Self {
        Self { registry }
    }
}

impl ExecutionBackend for ThreadBackend {
    fn submit(&self, job: Job) {
        let handle = job.handle();
        let verb = job.verb();
        let registry = Arc::clone(&self.registry);
        let spawned = thread::Builder::new()
            .name(format!("job-{handle}"))
            .spawn(move || job.run_into(&registry));

        if let Err(spawn_error) = spawned {
            error!(
                target: EXECUTOR_TARGET,
                %handle,
                error = %spawn_error,
                "failed to spawn job thread"
            );
            publish(
                &self.registry,
                handle,
                failure_outcome(verb, format_args!("could not start worker: {spawn_error}")),
            );
        }
    }
}
