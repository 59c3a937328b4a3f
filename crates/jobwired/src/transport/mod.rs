//! Socket listeners for the RPC and batch endpoints.
//!
//! Each listener binds a configured endpoint, accepts connections on a
//! background thread, and hands every connection to a [`ConnectionHandler`] on
//! a thread of its own.

mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod listener_tests;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream, RequestReader, write_line};
pub(crate) use self::listener::{ListenerHandle, SocketListener};
#[cfg(test)]
pub(crate) use self::test_utils::ConnectionTally;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
