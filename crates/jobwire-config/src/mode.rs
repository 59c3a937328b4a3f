//! How the single-command endpoint answers submissions.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Reply style of the RPC endpoint.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RpcMode {
    /// Submissions are acknowledged with a job handle and polled later.
    #[default]
    Async,
    /// Submissions run on the connection thread and the reply carries the
    /// outcome.
    Sync,
}

/// Errors encountered while parsing an [`RpcMode`] from text.
pub type RpcModeParseError = strum::ParseError;
