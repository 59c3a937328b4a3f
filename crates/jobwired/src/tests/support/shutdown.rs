//! Shutdown signal that tests trigger by hand.

use std::sync::{Arc, Condvar, Mutex, PoisonError};

use crate::process::{ShutdownError, ShutdownSignal};

/// Blocks `wait` until [`TestShutdownSignal::trigger`] is called.
#[derive(Debug, Clone, Default)]
pub struct TestShutdownSignal {
    state: Arc<(Mutex<bool>, Condvar)>,
}

impl TestShutdownSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Releases current and future waiters.
    pub fn trigger(&self) {
        let (flag, condvar) = &*self.state;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        condvar.notify_all();
    }
}

impl ShutdownSignal for TestShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let (flag, condvar) = &*self.state;
        let mut triggered = flag.lock().unwrap_or_else(PoisonError::into_inner);
        while !*triggered {
            triggered = condvar
                .wait(triggered)
                .unwrap_or_else(PoisonError::into_inner);
        }
        Ok(())
    }
}
