//! Shared table of job handles and their outcomes.
//!
//! Every submission is admitted by [`JobRegistry::allocate`], which hands out a
//! strictly increasing handle and records the job as pending. Workers publish
//! results with [`JobRegistry::complete`]; pollers read them back with
//! [`JobRegistry::peek`]. Reads never consume an outcome, so a handle can be
//! polled any number of times.
//!
//! The registry is safe to share across connection and worker threads behind an
//! [`Arc`](std::sync::Arc). A handle is taken from the counter and recorded as
//! pending under one lock, so the order in which handles become visible is the
//! order in which they were issued.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, trace, warn};

use jobwire_protocol::JobHandle;

pub(crate) const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Observable state of a handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// The job finished; the outcome text is returned verbatim.
    Completed(String),
    /// The handle was issued but no outcome has been stored yet.
    Pending,
    /// The handle was never issued, or its outcome has been evicted.
    UnknownHandle,
}

/// Errors raised when issuing handles or publishing outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Every handle up to `u64::MAX` has been issued.
    #[error("job handles exhausted")]
    Exhausted,
    /// The handle was never issued by this registry, or was already evicted.
    #[error("job handle {handle} was not issued by this registry")]
    UnknownHandle {
        /// Handle supplied by the caller.
        handle: JobHandle,
    },
    /// An outcome is already stored for the handle; the first write stands.
    #[error("job handle {handle} already has an outcome")]
    AlreadyCompleted {
        /// Handle supplied by the caller.
        handle: JobHandle,
    },
}

/// Concurrent handle allocator and outcome store.
#[derive(Debug)]
pub struct JobRegistry {
    retention: Option<usize>,
    table: Mutex<OutcomeTable>,
}

#[derive(Debug)]
struct OutcomeTable {
    /// Next raw handle; `None` once `u64::MAX` has been issued.
    next: Option<u64>,
    issued: u64,
    entries: HashMap<JobHandle, Option<String>>,
    completion_order: VecDeque<JobHandle>,
}

impl OutcomeTable {
    fn starting_at(first: u64) -> Self {
        Self {
            next: Some(first),
            issued: 0,
            entries: HashMap::new(),
            completion_order: VecDeque::new(),
        }
    }
}

impl JobRegistry {
    /// Creates a registry whose first handle is `first` and which keeps every
    /// completed outcome.
    #[must_use]
    pub fn new(first: u64) -> Self {
        Self {
            retention: None,
            table: Mutex::new(OutcomeTable::starting_at(first)),
        }
    }

    /// Bounds the number of completed outcomes kept in memory.
    ///
    /// Once the bound is exceeded the oldest completed outcome is dropped and
    /// its handle reports [`JobStatus::UnknownHandle`]. Pending jobs are never
    /// evicted. `None` (or zero) keeps every outcome.
    #[must_use]
    pub fn with_retention(mut self, retained: Option<usize>) -> Self {
        self.retention = retained.filter(|limit| *limit > 0);
        self
    }

    /// Issues a fresh handle and records the job as pending.
    ///
    /// Handles are unique and strictly increasing for the lifetime of the
    /// registry, including under concurrent callers. Once a handle is returned
    /// every smaller handle issued by this registry is already recorded.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Exhausted`] after `u64::MAX` has been issued.
    /// No handle is ever reused.
    pub fn allocate(&self) -> Result<JobHandle, RegistryError> {
        let mut table = self.lock();
        let Some(raw) = table.next else {
            warn!(target: REGISTRY_TARGET, "job handles exhausted");
            return Err(RegistryError::Exhausted);
        };
        table.next = raw.checked_add(1);
        table.issued += 1;
        let handle = JobHandle::new(raw);
        table.entries.insert(handle, None);
        trace!(target: REGISTRY_TARGET, %handle, "job handle issued");
        Ok(handle)
    }

    /// Stores the outcome for a pending handle.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownHandle`] for handles this registry never
    /// issued (or already evicted) and [`RegistryError::AlreadyCompleted`] when
    /// an outcome is already present. The stored outcome is left untouched in
    /// both cases.
    pub fn complete(&self, handle: JobHandle, outcome: String) -> Result<(), RegistryError> {
        let mut table = self.lock();
        let Some(slot) = table.entries.get_mut(&handle) else {
            return Err(RegistryError::UnknownHandle { handle });
        };
        if slot.is_some() {
            return Err(RegistryError::AlreadyCompleted { handle });
        }
        *slot = Some(outcome);
        table.completion_order.push_back(handle);
        if let Some(limit) = self.retention {
            while table.completion_order.len() > limit {
                let Some(evicted) = table.completion_order.pop_front() else {
                    break;
                };
                table.entries.remove(&evicted);
                debug!(target: REGISTRY_TARGET, handle = %evicted, "outcome evicted");
            }
        }
        trace!(target: REGISTRY_TARGET, %handle, "job outcome stored");
        Ok(())
    }

    /// Reports the state of a handle without consuming its outcome.
    #[must_use]
    pub fn peek(&self, handle: JobHandle) -> JobStatus {
        match self.lock().entries.get(&handle) {
            Some(Some(outcome)) => JobStatus::Completed(outcome.clone()),
            Some(None) => JobStatus::Pending,
            None => JobStatus::UnknownHandle,
        }
    }

    /// Number of handles issued so far.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.lock().issued
    }

    /// Number of jobs admitted but not yet completed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock()
            .entries
            .values()
            .filter(|outcome| outcome.is_none())
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, OutcomeTable> {
        // Every mutation is a single insert or remove; a poisoned table is
        // still consistent.
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
