//! Opaque job identifiers issued by the server registry.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use thiserror::Error;

/// Identifier returned when a job is admitted.
///
/// Handles are issued in strictly increasing order for the lifetime of the
/// server process and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobHandle(u64);

impl JobHandle {
    /// Wraps a raw handle value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for JobHandle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Error raised when text does not hold a decimal job handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid job handle '{input}': {source}")]
pub struct JobHandleParseError {
    input: String,
    #[source]
    source: ParseIntError,
}

impl FromStr for JobHandle {
    type Err = JobHandleParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        input
            .trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|source| JobHandleParseError {
                input: input.to_owned(),
                source,
            })
    }
}
