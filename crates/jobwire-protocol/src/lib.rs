//! Line-oriented wire codec shared by the jobwire server and client.
//!
//! Every exchange is plain text. A single-command request is one line of the
//! form `REQUEST: <verb> <operands...>` and the server answers with exactly one
//! `RESPONSE: <payload>` line. Submitting verbs (`foo`, `add`, `sort`) are
//! acknowledged with a job handle; `getResult <handle>` answers with the stored
//! outcome or the literal `NOT_READY`.
//!
//! ```text
//! REQUEST: sort 5 9 1 3 2      ->  RESPONSE: 1000
//! REQUEST: getResult 1000      ->  RESPONSE: NOT_READY
//! REQUEST: getResult 1000      ->  RESPONSE: [1,2,3,5,9]
//! ```
//!
//! Batch requests start with [`BATCH_HEADER`], carry one body line per
//! operation, and end with [`BATCH_SENTINEL`]. Body lines are decoded by
//! [`Operation::parse_body_line`], which reports verb-labelled failures so a
//! single bad line never invalidates the rest of the batch.
//!
//! The codec is pure: it performs no I/O and holds no state.

mod batch;
mod command;
mod error;
mod handle;
mod reply;

pub use batch::{BATCH_HEADER, BATCH_SENTINEL, BatchLineError};
pub use command::{Command, Operation, REQUEST_PREFIX, Verb};
pub use error::ProtocolError;
pub use handle::{JobHandle, JobHandleParseError};
pub use reply::{ERROR_PREFIX, NOT_READY, RESPONSE_PREFIX, Reply, response_payload};
