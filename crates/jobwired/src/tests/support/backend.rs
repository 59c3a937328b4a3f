//! Execution backend that holds jobs until a test releases them.

use std::sync::{Arc, Mutex, PoisonError};

use crate::executor::{ExecutionBackend, Job};
use crate::registry::JobRegistry;

/// Queues submitted jobs so scenarios can observe the pending state.
pub struct GatedBackend {
    registry: Arc<JobRegistry>,
    queued: Mutex<Vec<Job>>,
}

impl GatedBackend {
    #[must_use]
    pub fn new(registry: Arc<JobRegistry>) -> Self {
        Self {
            registry,
            queued: Mutex::new(Vec::new()),
        }
    }

    /// Runs every queued job on the calling thread, oldest first.
    pub fn release_all(&self) {
        let jobs = std::mem::take(
            &mut *self.queued.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for job in jobs {
            job.run_into(&self.registry);
        }
    }

    /// Number of jobs waiting to be released.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ExecutionBackend for GatedBackend {
    fn submit(&self, job: Job) {
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(job);
    }
}
