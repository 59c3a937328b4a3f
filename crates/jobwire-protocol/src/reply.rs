//! Response encoding for single-command exchanges.

use std::fmt;

use crate::error::ProtocolError;
use crate::handle::JobHandle;

/// Prefix carried by every response line.
pub const RESPONSE_PREFIX: &str = "RESPONSE:";

/// Payload returned when a polled job has no stored outcome.
///
/// The token covers both a job that is still running and a handle this
/// process never issued; the wire cannot tell them apart.
pub const NOT_READY: &str = "NOT_READY";

/// Leading text of every error payload.
pub const ERROR_PREFIX: &str = "ERROR - ";

/// Immediate answer to a single-command request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A submission was admitted under this handle.
    Accepted(JobHandle),
    /// The polled job finished with this outcome.
    Ready(String),
    /// The polled job has no outcome yet (or is unknown).
    NotReady,
    /// The request was refused.
    Rejected(ProtocolError),
}

impl Reply {
    /// Encodes the reply as a response line without the trailing newline.
    ///
    /// Encoding is deterministic: equal replies always yield equal lines.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted(handle) => write!(formatter, "{RESPONSE_PREFIX} {handle}"),
            Self::Ready(outcome) => write!(formatter, "{RESPONSE_PREFIX} {outcome}"),
            Self::NotReady => write!(formatter, "{RESPONSE_PREFIX} {NOT_READY}"),
            Self::Rejected(error) => write!(formatter, "{RESPONSE_PREFIX} {ERROR_PREFIX}{error}"),
        }
    }
}

/// Strips the response prefix and surrounding whitespace from a reply line.
///
/// Returns `None` when the line does not start with [`RESPONSE_PREFIX`].
#[must_use]
pub fn response_payload(line: &str) -> Option<&str> {
    line.trim_end()
        .strip_prefix(RESPONSE_PREFIX)
        .map(str::trim)
}
