//! Connection handler for the batch endpoint.

use std::io::{self, Write};

use tracing::{debug, warn};

use crate::transport::{ConnectionHandler, ConnectionStream, RequestReader};

use super::processor::{BatchProcessor, BatchState};
use super::{BATCH_TARGET, MAX_BATCH_BYTES, MAX_LINE_BYTES};

/// Streams batch lines into a [`BatchProcessor`] and writes the aggregated
/// reply once the sentinel arrives or the client stops sending.
#[derive(Debug, Default)]
pub(crate) struct BatchConnectionHandler;

impl BatchConnectionHandler {
    fn serve(&self, mut stream: ConnectionStream) {
        let mut processor = BatchProcessor::new();
        {
            let mut reader = RequestReader::new(&mut stream, MAX_LINE_BYTES, MAX_BATCH_BYTES);
            loop {
                match reader.next_line() {
                    Ok(Some(line)) => {
                        if processor.feed(&line) == BatchState::Completed {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(error) => {
                        warn!(target: BATCH_TARGET, %error, "failed to read batch");
                        return;
                    }
                }
            }
        }

        let Some(reply) = processor.finish() else {
            debug!(target: BATCH_TARGET, "client disconnected without request");
            return;
        };
        debug!(
            target: BATCH_TARGET,
            operations = reply.lines().len(),
            "batch processed"
        );

        if let Err(error) = write_reply(&mut stream, &reply.encode()) {
            warn!(target: BATCH_TARGET, %error, "failed to write batch reply");
        }
    }
}

fn write_reply(stream: &mut ConnectionStream, text: &str) -> io::Result<()> {
    stream.write_all(text.as_bytes())?;
    stream.flush()
}

impl ConnectionHandler for BatchConnectionHandler {
    fn handle(&self, stream: ConnectionStream) {
        self.serve(stream);
    }
}
