//! Connection handler for the single-command endpoint.

use std::sync::Arc;

use tracing::{debug, warn};

use jobwire_config::RpcMode;
use jobwire_protocol::Reply;

use crate::executor::ExecutionBackend;
use crate::transport::{ConnectionHandler, ConnectionStream, RequestReader, write_line};

use super::dispatcher::{Dispatch, Dispatcher};
use super::{DISPATCH_TARGET, MAX_REQUEST_BYTES};

/// Reads one request line, dispatches it, and writes one reply line.
///
/// In [`RpcMode::Async`] admitted jobs are handed to the backend before the
/// reply is written, so a client that polls straight after reading its handle
/// always finds the job registered. In [`RpcMode::Sync`] the connection waits
/// while the request runs and the reply carries its outcome.
pub(crate) struct RpcConnectionHandler {
    dispatcher: Dispatcher,
    backend: Arc<dyn ExecutionBackend>,
    mode: RpcMode,
}

impl RpcConnectionHandler {
    pub(crate) fn new(dispatcher: Dispatcher, backend: Arc<dyn ExecutionBackend>) -> Self {
        Self {
            dispatcher,
            backend,
            mode: RpcMode::Async,
        }
    }

    pub(crate) fn with_mode(mut self, mode: RpcMode) -> Self {
        self.mode = mode;
        self
    }

    fn respond(&self, line: &str) -> Reply {
        if self.mode == RpcMode::Sync {
            return self.dispatcher.answer_line(line);
        }
        let Dispatch { reply, job } = self.dispatcher.dispatch_line(line);
        if let Some(job) = job {
            self.backend.submit(job);
        }
        reply
    }

    fn serve(&self, mut stream: ConnectionStream) {
        let line = {
            let mut reader = RequestReader::new(&mut stream, MAX_REQUEST_BYTES, MAX_REQUEST_BYTES);
            match reader.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!(target: DISPATCH_TARGET, "client disconnected without request");
                    return;
                }
                Err(error) => {
                    warn!(target: DISPATCH_TARGET, %error, "failed to read request");
                    return;
                }
            }
        };

        let reply = self.respond(&line);
        if let Err(error) = write_line(&mut stream, &reply.encode()) {
            warn!(target: DISPATCH_TARGET, %error, "failed to write reply");
        }
    }
}

impl ConnectionHandler for RpcConnectionHandler {
    fn handle(&self, stream: ConnectionStream) {
        self.serve(stream);
    }
}
