//! Reporter double that keeps every lifecycle milestone it sees.

use std::sync::{Mutex, PoisonError};

use crate::health::{HealthReporter, Lifecycle};

/// Owned copy of a [`Lifecycle`] milestone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ListenersReady,
    ShutdownStarted,
}

impl From<Lifecycle<'_>> for HealthEvent {
    fn from(event: Lifecycle<'_>) -> Self {
        match event {
            Lifecycle::BootstrapStarting => Self::BootstrapStarting,
            Lifecycle::BootstrapSucceeded(_) => Self::BootstrapSucceeded,
            Lifecycle::BootstrapFailed(error) => Self::BootstrapFailed(error.to_string()),
            Lifecycle::ListenersReady(_) => Self::ListenersReady,
            Lifecycle::ShutdownStarted => Self::ShutdownStarted,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Milestones seen so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn report(&self, event: Lifecycle<'_>) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.into());
    }
}
