//! Connection handling abstractions shared by the RPC and batch listeners.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpStream;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

use super::errors::TransportError;

/// Stream types accepted by the listeners.
pub(crate) enum ConnectionStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: ConnectionStream);
}

/// Bounded, newline-delimited request reader.
///
/// Each line may be at most `line_limit` bytes including its terminator, and
/// the whole request at most `total_limit` bytes. A final line without a
/// terminator is returned as-is when the peer closes the stream.
pub(crate) struct RequestReader<R> {
    inner: BufReader<R>,
    line_limit: usize,
    remaining: usize,
}

impl<R: Read> RequestReader<R> {
    pub(crate) fn new(stream: R, line_limit: usize, total_limit: usize) -> Self {
        Self {
            inner: BufReader::new(stream),
            line_limit,
            remaining: total_limit,
        }
    }

    /// Reads the next line, or `None` once the peer has closed the stream.
    pub(crate) fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        let budget = self.line_limit.min(self.remaining);
        let mut line = Vec::new();
        // `read_until` already retries on `Interrupted`.
        let read = (&mut self.inner)
            .take(budget as u64 + 1)
            .read_until(b'\n', &mut line)?;
        if read == 0 {
            return Ok(None);
        }
        if read > budget {
            return Err(TransportError::TooLarge { limit: budget });
        }
        self.remaining -= read;

        let text = String::from_utf8_lossy(&line);
        Ok(Some(text.trim_end_matches(['\r', '\n']).to_owned()))
    }
}

/// Writes `text` followed by a newline and flushes the stream.
pub(crate) fn write_line(stream: &mut impl Write, text: &str) -> io::Result<()> {
    stream.write_all(text.as_bytes())?;
    stream.write_all(b"\n")?;
    stream.flush()
}
