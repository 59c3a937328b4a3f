//! Batch request processing.
//!
//! A batch connection sends [`BATCH_HEADER`], any number of operation lines,
//! and [`BATCH_SENTINEL`]. Operations run synchronously in the order received
//! and the server answers with `RESPONSE:` followed by one line per operation.
//! A line that fails to decode or evaluate contributes a labelled error line
//! and never affects its neighbours. Batch work bypasses the job registry.

mod handler;
mod processor;

pub(crate) use self::handler::BatchConnectionHandler;
pub use self::processor::{BatchProcessor, BatchReply, BatchState, NOT_A_BATCH, execute_line};

pub(crate) const BATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::batch");

/// Longest accepted batch line in bytes, terminator included.
pub(crate) const MAX_LINE_BYTES: usize = 64 * 1024;

/// Largest accepted batch request in bytes.
pub(crate) const MAX_BATCH_BYTES: usize = 16 * 1024 * 1024;

#[doc(inline)]
pub use jobwire_protocol::{BATCH_HEADER, BATCH_SENTINEL};
