//! Built-in workloads behind the submitting verbs.
//!
//! [`evaluate`] performs the arithmetic for an [`Operation`] with checked
//! integer maths. The resulting [`Evaluation`] renders two ways: as the outcome
//! stored for a polled job and as a line of an aggregated batch reply.

use jobwire_protocol::Operation;

use crate::executor::{Workload, WorkloadError};

/// Result of running one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Sum of `0..iterations`.
    Count {
        /// Loop bound supplied by the client.
        iterations: u64,
        /// Accumulated total.
        total: u64,
    },
    /// Sum of two operands.
    Sum {
        /// Left operand.
        lhs: i64,
        /// Right operand.
        rhs: i64,
        /// `lhs + rhs`.
        total: i64,
    },
    /// Values in ascending order.
    Sorted(Vec<i64>),
}

impl Evaluation {
    /// Outcome text stored for a polled job.
    #[must_use]
    pub fn outcome(&self) -> String {
        match self {
            Self::Count { total, .. } => format!("OK: foo={total}"),
            Self::Sum { total, .. } => total.to_string(),
            Self::Sorted(values) => format_values(values),
        }
    }

    /// Line reported for this operation inside a batch reply.
    #[must_use]
    pub fn batch_line(&self) -> String {
        match self {
            Self::Count { iterations, total } => format!("foo({iterations}) = {total}"),
            Self::Sum { lhs, rhs, total } => format!("add({lhs},{rhs}) = {total}"),
            Self::Sorted(values) => format!("sort => {}", format_values(values)),
        }
    }
}

/// Runs `operation` to completion on the calling thread.
///
/// # Errors
///
/// Returns [`WorkloadError::Overflow`] when a checked sum exceeds its integer
/// range.
pub fn evaluate(operation: &Operation) -> Result<Evaluation, WorkloadError> {
    match operation {
        Operation::Count { iterations } => Ok(Evaluation::Count {
            iterations: *iterations,
            total: count_to(*iterations)?,
        }),
        Operation::Add { lhs, rhs } => Ok(Evaluation::Sum {
            lhs: *lhs,
            rhs: *rhs,
            total: lhs.checked_add(*rhs).ok_or(WorkloadError::Overflow)?,
        }),
        Operation::Sort { values } => {
            let mut sorted = values.clone();
            sorted.sort_unstable();
            Ok(Evaluation::Sorted(sorted))
        }
    }
}

/// Sums `0..iterations` one step at a time, so cost grows linearly with the
/// bound.
///
/// # Errors
///
/// Returns [`WorkloadError::Overflow`] if the running total leaves `u64`.
pub fn count_to(iterations: u64) -> Result<u64, WorkloadError> {
    (0..iterations)
        .try_fold(0_u64, u64::checked_add)
        .ok_or(WorkloadError::Overflow)
}

/// Renders values as `[a,b,c]` with no spaces.
#[must_use]
pub fn format_values(values: &[i64]) -> String {
    let joined = values
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("[{joined}]")
}

/// Source of the workload run for each submitted operation.
///
/// The dispatcher asks the catalogue for a workload once a handle has been
/// issued, so alternative implementations can swap in any unit of work.
pub trait WorkloadCatalogue: Send + Sync {
    /// Builds the deferred work for `operation`.
    fn prepare(&self, operation: Operation) -> Workload;
}

/// Catalogue backed by [`evaluate`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardCatalogue;

impl WorkloadCatalogue for StandardCatalogue {
    fn prepare(&self, operation: Operation) -> Workload {
        Box::new(move || evaluate(&operation).map(|evaluation| evaluation.outcome()))
    }
}
