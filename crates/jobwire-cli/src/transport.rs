//! One request, one reply: the socket exchange both clients share.

use std::io::{self, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use jobwire_config::SocketEndpoint;

use crate::errors::ClientError;

/// Upper bound on establishing a connection.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

trait Duplex: Read + Write {}

impl<T: Read + Write> Duplex for T {}

pub(crate) enum Connection {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Connection {
    fn open(endpoint: &SocketEndpoint) -> Result<Self, ClientError> {
        let refused = |source| ClientError::Connect {
            endpoint: endpoint.to_string(),
            source,
        };
        match endpoint {
            SocketEndpoint::Tcp { host, port } => {
                let candidates = (host.as_str(), *port).to_socket_addrs().map_err(|source| {
                    ClientError::Resolve {
                        endpoint: endpoint.to_string(),
                        source,
                    }
                })?;
                let mut last = io::Error::new(io::ErrorKind::AddrNotAvailable, "no resolved addresses");
                for addr in candidates {
                    match TcpStream::connect_timeout(&addr, CONNECTION_TIMEOUT) {
                        Ok(stream) => return Ok(Self::Tcp(stream)),
                        Err(error) => last = error,
                    }
                }
                Err(refused(last))
            }
            #[cfg(unix)]
            SocketEndpoint::Unix { path } => unix::connect(path.as_str()).map(Self::Unix).map_err(refused),
            #[cfg(not(unix))]
            SocketEndpoint::Unix { .. } => {
                let _ = refused;
                Err(ClientError::UnsupportedUnixTransport(endpoint.to_string()))
            }
        }
    }

    fn duplex(&mut self) -> &mut dyn Duplex {
        match self {
            Self::Tcp(stream) => stream,
            #[cfg(unix)]
            Self::Unix(stream) => stream,
        }
    }

    /// Half-closes the write side so the server reads end of stream.
    fn close_write(&self) -> io::Result<()> {
        let closed = match self {
            Self::Tcp(stream) => stream.shutdown(Shutdown::Write),
            #[cfg(unix)]
            Self::Unix(stream) => stream.shutdown(Shutdown::Write),
        };
        match closed {
            // The server may have answered and hung up already.
            Err(error) if error.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.duplex().read(buf)
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.duplex().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.duplex().flush()
    }
}

/// Sends `request` in one write, ends the request, and hands back the reply
/// stream.
pub(crate) fn exchange(
    endpoint: &SocketEndpoint,
    request: &str,
) -> Result<BufReader<Connection>, ClientError> {
    let mut connection = Connection::open(endpoint)?;
    connection
        .write_all(request.as_bytes())
        .and_then(|()| connection.flush())
        .and_then(|()| connection.close_write())
        .map_err(ClientError::SendRequest)?;
    Ok(BufReader::new(connection))
}

#[cfg(unix)]
mod unix {
    use std::io;
    use std::os::unix::net::UnixStream;

    use socket2::{Domain, SockAddr, Socket, Type};

    use super::CONNECTION_TIMEOUT;

    /// Connects within [`CONNECTION_TIMEOUT`].
    pub(super) fn connect(path: &str) -> io::Result<UnixStream> {
        let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
        socket.connect_timeout(&SockAddr::unix(path)?, CONNECTION_TIMEOUT)?;
        Ok(socket.into())
    }
}
