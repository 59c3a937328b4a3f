//! Connection handler used by transport tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use super::{ConnectionHandler, ConnectionStream};

/// Tallies accepted connections and closes them unread.
#[derive(Clone, Default)]
pub(crate) struct ConnectionTally {
    seen: Arc<AtomicUsize>,
}

impl ConnectionTally {
    pub(crate) fn accepted(&self) -> usize {
        self.seen.load(Ordering::SeqCst)
    }

    /// Polls until at least `expected` connections arrived or `limit` passed.
    pub(crate) fn wait_for(&self, expected: usize, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        loop {
            if self.accepted() >= expected {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    pub(crate) fn handler(&self) -> Arc<dyn ConnectionHandler> {
        Arc::new(self.clone())
    }
}

impl ConnectionHandler for ConnectionTally {
    fn handle(&self, stream: ConnectionStream) {
        drop(stream);
        self.seen.fetch_add(1, Ordering::SeqCst);
    }
}
