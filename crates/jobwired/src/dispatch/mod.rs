//! Single-command request dispatch.
//!
//! A connection on the RPC endpoint carries exactly one request line. The
//! [`Dispatcher`] decodes it, admits submissions into the
//! [`JobRegistry`](crate::JobRegistry), and answers polls from the stored
//! outcomes. [`RpcConnectionHandler`] glues the dispatcher to the transport:
//! it hands admitted jobs to the execution backend before writing the reply,
//! then closes the connection.

mod dispatcher;
mod handler;

pub use self::dispatcher::{Dispatch, Dispatcher};
pub(crate) use self::handler::RpcConnectionHandler;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Longest accepted request line in bytes, terminator included.
pub(crate) const MAX_REQUEST_BYTES: usize = 64 * 1024;
