//! Line-at-a-time batch state machine.

use jobwire_protocol::{BATCH_HEADER, BATCH_SENTINEL, Operation, RESPONSE_PREFIX};

use crate::executor::WorkloadError;
use crate::operations::evaluate;

/// Reply line sent when the first line is not the batch header.
pub const NOT_A_BATCH: &str = "ERROR: not a BATCH request";

/// Progress through a batch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// No line has been received yet.
    AwaitingHeader,
    /// The header was accepted; operation lines are being collected.
    ReadingBody,
    /// The sentinel arrived or the header was rejected; further lines are
    /// ignored.
    Completed,
}

/// Consumes batch lines and accumulates the reply.
#[derive(Debug)]
pub struct BatchProcessor {
    state: BatchState,
    lines: Vec<String>,
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchProcessor {
    /// Creates a processor waiting for the header line.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: BatchState::AwaitingHeader,
            lines: Vec::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Feeds one line (without its terminator) and returns the new state.
    ///
    /// Blank body lines are skipped. Each other body line is executed
    /// immediately and contributes exactly one reply line.
    pub fn feed(&mut self, line: &str) -> BatchState {
        let line = line.trim();
        self.state = match self.state {
            BatchState::AwaitingHeader if line == BATCH_HEADER => BatchState::ReadingBody,
            BatchState::AwaitingHeader => {
                self.lines.push(NOT_A_BATCH.to_owned());
                BatchState::Completed
            }
            BatchState::ReadingBody if line == BATCH_SENTINEL => BatchState::Completed,
            BatchState::ReadingBody => {
                if !line.is_empty() {
                    self.lines.push(execute_line(line));
                }
                BatchState::ReadingBody
            }
            BatchState::Completed => BatchState::Completed,
        };
        self.state
    }

    /// Number of reply lines accumulated so far.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.lines.len()
    }

    /// Ends the batch and returns the reply.
    ///
    /// Returns `None` when no line was ever fed, so a client that sent nothing
    /// receives nothing. A batch cut short before the sentinel still answers
    /// for every operation already received.
    #[must_use]
    pub fn finish(self) -> Option<BatchReply> {
        match self.state {
            BatchState::AwaitingHeader => None,
            BatchState::ReadingBody | BatchState::Completed => Some(BatchReply {
                lines: self.lines,
            }),
        }
    }
}

/// Aggregated answer to a batch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReply {
    lines: Vec<String>,
}

impl BatchReply {
    /// One line per processed operation, in submission order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Encodes the reply as `RESPONSE:` followed by one newline-terminated
    /// line per operation.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut text = String::from(RESPONSE_PREFIX);
        text.push('\n');
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}

/// Decodes and evaluates one body line, returning its reply line.
#[must_use]
pub fn execute_line(line: &str) -> String {
    let operation = match Operation::parse_body_line(line) {
        Ok(operation) => operation,
        Err(error) => return error.to_string(),
    };
    let verb = operation.verb();
    match evaluate(&operation) {
        Ok(evaluation) => evaluation.batch_line(),
        Err(WorkloadError::Overflow) => format!("ERROR({verb}): overflow"),
        Err(error) => format!("ERROR({verb}): {error}"),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn run(lines: &[&str]) -> Option<BatchReply> {
        let mut processor = BatchProcessor::new();
        for line in lines {
            if processor.feed(line) == BatchState::Completed {
                break;
            }
        }
        processor.finish()
    }

    #[test]
    fn mixed_batches_report_every_line_in_order() {
        let reply = run(&[
            "REQUEST: BATCH",
            "foo 100000",
            "add 2 3",
            "sort 2 9 1",
            "END",
        ])
        .expect("reply");
        assert_eq!(
            reply.encode(),
            "RESPONSE:\nfoo(100000) = 4999950000\nadd(2,3) = 5\nsort => [1,9]\n"
        );
    }

    #[test]
    fn bad_lines_do_not_affect_their_neighbours() {
        let reply = run(&[
            "REQUEST: BATCH",
            "add 1 2",
            "add x 2",
            "bogus",
            "add 2147483647 1",
            "add 9223372036854775807 1",
            "END",
        ])
        .expect("reply");
        assert_eq!(
            reply.lines(),
            [
                "add(1,2) = 3",
                "ERROR(add): invalid number format",
                "ERROR: Unknown command bogus",
                "add(2147483647,1) = 2147483648",
                "ERROR(add): overflow",
            ]
        );
    }

    #[rstest]
    #[case::wrong_header(&["REQUEST: foo 1", "END"])]
    #[case::blank_header(&["", "REQUEST: BATCH", "END"])]
    fn non_batch_requests_are_rejected(#[case] lines: &[&str]) {
        let reply = run(lines).expect("reply");
        assert_eq!(reply.encode(), "RESPONSE:\nERROR: not a BATCH request\n");
    }

    #[test]
    fn header_and_sentinel_tolerate_surrounding_whitespace() {
        let reply = run(&["  REQUEST: BATCH\r", "add 1 1", " END "]).expect("reply");
        assert_eq!(reply.lines(), ["add(1,1) = 2"]);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let reply = run(&["REQUEST: BATCH", "", "   ", "add 1 1", "", "END"]).expect("reply");
        assert_eq!(reply.lines(), ["add(1,1) = 2"]);
    }

    #[test]
    fn empty_batches_reply_with_the_prefix_only() {
        let reply = run(&["REQUEST: BATCH", "END"]).expect("reply");
        assert_eq!(reply.encode(), "RESPONSE:\n");
    }

    #[test]
    fn unterminated_batches_still_answer_received_lines() {
        let reply = run(&["REQUEST: BATCH", "add 4 4", "sort 1 7"]).expect("reply");
        assert_eq!(reply.lines(), ["add(4,4) = 8", "sort => [7]"]);
    }

    #[test]
    fn silent_connections_produce_no_reply() {
        assert_eq!(run(&[]), None);
    }

    #[test]
    fn lines_after_the_sentinel_are_ignored() {
        let mut processor = BatchProcessor::new();
        processor.feed("REQUEST: BATCH");
        processor.feed("END");
        assert_eq!(processor.feed("add 1 1"), BatchState::Completed);
        assert_eq!(processor.processed(), 0);
    }
}
