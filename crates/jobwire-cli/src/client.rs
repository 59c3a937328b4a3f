//! Blocking clients for the RPC and batch endpoints.

use std::io::BufRead;
use std::thread;
use std::time::Duration;

use jobwire_config::SocketEndpoint;
use jobwire_protocol::{
    BATCH_HEADER, BATCH_SENTINEL, Command, ERROR_PREFIX, JobHandle, NOT_READY, Operation,
    RESPONSE_PREFIX, response_payload,
};

use crate::errors::ClientError;
use crate::transport::exchange;

/// Answer to a `getResult` poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// The job finished with this outcome text.
    Ready(String),
    /// No outcome is stored for the handle yet.
    NotReady,
}

/// Client for the single-command endpoint.
///
/// Every call opens a fresh connection, mirroring the one-request-per-connection
/// protocol.
#[derive(Debug, Clone)]
pub struct RpcClient {
    endpoint: SocketEndpoint,
}

impl RpcClient {
    /// Creates a client targeting `endpoint`.
    #[must_use]
    pub fn new(endpoint: SocketEndpoint) -> Self {
        Self { endpoint }
    }

    /// Sends one command and returns the reply payload without the
    /// `RESPONSE:` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the exchange fails or the reply lacks the
    /// response prefix.
    pub fn call(&self, command: &Command) -> Result<String, ClientError> {
        let request = format!("{}\n", command.to_request_line());
        let mut reply = exchange(&self.endpoint, &request)?;
        let mut line = String::new();
        let read = reply.read_line(&mut line).map_err(ClientError::ReadReply)?;
        if read == 0 {
            return Err(ClientError::MissingReply);
        }
        response_payload(&line)
            .map(str::to_owned)
            .ok_or_else(|| ClientError::UnexpectedReply {
                line: line.trim_end().to_owned(),
            })
    }

    /// Submits a job and returns the handle the server issued.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] when the server refuses the request
    /// and [`ClientError::UnexpectedReply`] when the reply is not a handle.
    pub fn submit(&self, command: &Command) -> Result<JobHandle, ClientError> {
        let payload = self.call(command)?;
        if let Some(message) = payload.strip_prefix(ERROR_PREFIX) {
            return Err(ClientError::Rejected {
                message: message.to_owned(),
            });
        }
        payload
            .parse::<JobHandle>()
            .map_err(|_| ClientError::UnexpectedReply {
                line: format!("{RESPONSE_PREFIX} {payload}"),
            })
    }

    /// Sends `operation` to a server in sync mode and returns its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] when the reply is an error payload,
    /// whether the request was refused or the operation failed.
    pub fn execute(&self, operation: Operation) -> Result<String, ClientError> {
        let payload = self.call(&Command::Submit(operation))?;
        match payload.strip_prefix(ERROR_PREFIX) {
            Some(message) => Err(ClientError::Rejected {
                message: message.to_owned(),
            }),
            None => Ok(payload),
        }
    }

    /// Asks for the outcome of `handle` once.
    ///
    /// A handle the server never issued also reports
    /// [`PollStatus::NotReady`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the exchange fails or the request is
    /// rejected.
    pub fn poll(&self, handle: JobHandle) -> Result<PollStatus, ClientError> {
        let payload = self.call(&Command::Poll { handle })?;
        if payload == NOT_READY {
            return Ok(PollStatus::NotReady);
        }
        Ok(PollStatus::Ready(payload))
    }

    /// Polls `handle` up to `attempts` times, sleeping `interval` between
    /// polls, and returns the first outcome seen.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotReady`] when every poll reported not ready.
    pub fn wait(
        &self,
        handle: JobHandle,
        interval: Duration,
        attempts: u32,
    ) -> Result<String, ClientError> {
        for attempt in 0..attempts {
            if attempt > 0 {
                thread::sleep(interval);
            }
            if let PollStatus::Ready(outcome) = self.poll(handle)? {
                return Ok(outcome);
            }
        }
        Err(ClientError::NotReady { handle, attempts })
    }
}

/// Client for the batch endpoint.
#[derive(Debug, Clone)]
pub struct BatchClient {
    endpoint: SocketEndpoint,
}

impl BatchClient {
    /// Creates a client targeting `endpoint`.
    #[must_use]
    pub fn new(endpoint: SocketEndpoint) -> Self {
        Self { endpoint }
    }

    /// Runs `operations` as one batch and returns the result lines, one per
    /// operation, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::EmptySort`] before connecting when a `sort`
    /// has no values, and [`ClientError`] when the exchange fails or the
    /// reply lacks the response header.
    pub fn run(&self, operations: &[Operation]) -> Result<Vec<String>, ClientError> {
        let empty_sort = operations
            .iter()
            .any(|operation| matches!(operation, Operation::Sort { values } if values.is_empty()));
        if empty_sort {
            return Err(ClientError::EmptySort);
        }
        let body: Vec<String> = operations.iter().map(Operation::to_body_line).collect();
        self.send_lines(&body)
    }

    /// Sends pre-encoded body lines between the batch header and sentinel.
    ///
    /// Lines are passed through untouched, so the server reports any that do
    /// not decode.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the exchange fails or the reply lacks the
    /// response header.
    pub fn send_lines<S: AsRef<str>>(&self, body: &[S]) -> Result<Vec<String>, ClientError> {
        let mut request = format!("{BATCH_HEADER}\n");
        for line in body {
            request.push_str(line.as_ref());
            request.push('\n');
        }
        request.push_str(BATCH_SENTINEL);
        request.push('\n');

        let mut lines = exchange(&self.endpoint, &request)?.lines();
        let header = lines
            .next()
            .ok_or(ClientError::MissingReply)?
            .map_err(ClientError::ReadReply)?;
        if header.trim_end() != RESPONSE_PREFIX {
            return Err(ClientError::UnexpectedReply { line: header });
        }
        lines
            .collect::<Result<Vec<_>, _>>()
            .map_err(ClientError::ReadReply)
    }
}
