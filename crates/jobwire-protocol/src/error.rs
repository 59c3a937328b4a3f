//! Protocol-level failures that are answered with an error reply.

use thiserror::Error;

/// Errors detected while decoding or admitting a single-command request.
///
/// None of these terminate the connection: each is rendered into a
/// `RESPONSE: ERROR - ...` line by [`crate::Reply::Rejected`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The line lacks the `REQUEST:` prefix or a verb.
    #[error("Invalid request: {reason}")]
    MalformedRequest {
        /// Why the line could not be structured.
        reason: String,
    },

    /// An operand is missing, surplus, or not an integer.
    #[error("Invalid operand for {verb}: {reason}")]
    InvalidOperand {
        /// Verb whose operands were rejected.
        verb: String,
        /// What was wrong with the operands.
        reason: String,
    },

    /// The verb is not one of the supported methods.
    #[error("Unknown method {verb}")]
    UnknownMethod {
        /// Verb as received.
        verb: String,
    },

    /// The server has no job handles left to issue.
    #[error("Job handles exhausted")]
    HandlesExhausted,
}

impl ProtocolError {
    /// Creates a malformed request error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRequest {
            reason: reason.into(),
        }
    }

    /// Creates an invalid operand error.
    pub fn invalid_operand(verb: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOperand {
            verb: verb.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unknown method error.
    pub fn unknown_method(verb: impl Into<String>) -> Self {
        Self::UnknownMethod { verb: verb.into() }
    }
}
