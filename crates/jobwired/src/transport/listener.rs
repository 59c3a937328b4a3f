//! Accept loops for the RPC and batch sockets.

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use jobwire_config::SocketEndpoint;

use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError};

#[cfg(unix)]
use std::os::unix::net::UnixListener;
#[cfg(unix)]
use std::path::PathBuf;

/// Pause between polls when no client is waiting.
const IDLE_POLL: Duration = Duration::from_millis(25);
/// Pause after a failed accept before polling again.
const FAILURE_POLL: Duration = Duration::from_millis(150);

/// Endpoint bound but not yet accepting.
#[derive(Debug)]
pub(crate) struct SocketListener {
    role: &'static str,
    endpoint: SocketEndpoint,
    acceptor: Acceptor,
}

impl SocketListener {
    /// Binds `endpoint`. `role` names the listener in logs and thread names.
    pub(crate) fn bind(role: &'static str, endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        Ok(Self {
            role,
            endpoint: endpoint.clone(),
            acceptor: Acceptor::bind(endpoint)?,
        })
    }

    /// Bound TCP address. Unix listeners report `None`.
    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        self.acceptor.local_addr()
    }

    /// Moves the listener onto its own thread and starts accepting.
    ///
    /// Each connection is served by `handler` on a dedicated thread.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        self.acceptor
            .set_nonblocking()
            .map_err(|source| ListenerError::Configure {
                endpoint: self.endpoint.to_string(),
                source,
            })?;

        let role = self.role;
        let stop = Arc::new(AtomicBool::new(false));
        let accept_loop = AcceptLoop {
            listener: self,
            stop: Arc::clone(&stop),
            handler,
        };
        let thread = thread::Builder::new()
            .name(format!("{role}-listener"))
            .spawn(move || accept_loop.run())
            .map_err(|source| ListenerError::Spawn { role, source })?;

        Ok(ListenerHandle {
            role,
            stop,
            thread: Some(thread),
        })
    }
}

/// Control over a running accept loop. Dropping it stops the loop.
#[derive(Debug)]
pub(crate) struct ListenerHandle {
    role: &'static str,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// Requests the accept loop to exit at its next poll.
    pub(crate) fn shutdown(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Blocks until the accept loop has exited.
    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        let role = self.role;
        match self.thread.take().map(JoinHandle::join) {
            Some(Err(_)) => Err(ListenerError::Panicked { role }),
            Some(Ok(())) | None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct AcceptLoop {
    listener: SocketListener,
    stop: Arc<AtomicBool>,
    handler: Arc<dyn ConnectionHandler>,
}

impl AcceptLoop {
    fn run(self) {
        let role = self.listener.role;
        let endpoint = &self.listener.endpoint;
        info!(target: LISTENER_TARGET, role, %endpoint, "listening");

        // Only the first of a run of identical accept failures is logged.
        let mut failing = None;
        while !self.stop.load(Ordering::Acquire) {
            let pause = match self.listener.acceptor.poll() {
                Ok(Some(stream)) => {
                    failing = None;
                    self.dispatch(stream);
                    continue;
                }
                Ok(None) => IDLE_POLL,
                Err(error) => {
                    if failing.replace(error.kind()) != Some(error.kind()) {
                        warn!(target: LISTENER_TARGET, role, %error, "accept failed");
                    }
                    FAILURE_POLL
                }
            };
            thread::sleep(pause);
        }

        info!(target: LISTENER_TARGET, role, %endpoint, "listener stopped");
    }

    fn dispatch(&self, stream: ConnectionStream) {
        let role = self.listener.role;
        let handler = Arc::clone(&self.handler);
        let spawned = thread::Builder::new()
            .name(format!("{role}-connection"))
            .spawn(move || handler.handle(stream));
        if let Err(error) = spawned {
            warn!(target: LISTENER_TARGET, role, %error, "connection dropped: no thread");
        } else {
            debug!(target: LISTENER_TARGET, role, "connection accepted");
        }
    }
}

#[derive(Debug)]
enum Acceptor {
    Tcp(TcpListener),
    /// Owns its socket file and unlinks it when dropped.
    #[cfg(unix)]
    Unix { listener: UnixListener, path: PathBuf },
}

impl Acceptor {
    fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        match endpoint {
            SocketEndpoint::Tcp { host, port } => bind_first_address(endpoint, host, *port).map(Self::Tcp),
            #[cfg(unix)]
            SocketEndpoint::Unix { path } => {
                let path = path.clone().into_std_path_buf();
                unix::reclaim(&path)?;
                let listener = UnixListener::bind(&path).map_err(|source| ListenerError::Bind {
                    endpoint: endpoint.to_string(),
                    source,
                })?;
                Ok(Self::Unix { listener, path })
            }
            #[cfg(not(unix))]
            SocketEndpoint::Unix { .. } => Err(ListenerError::UnsupportedUnix {
                endpoint: endpoint.to_string(),
            }),
        }
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        match self {
            Self::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            Self::Unix { .. } => None,
        }
    }

    fn set_nonblocking(&self) -> io::Result<()> {
        match self {
            Self::Tcp(listener) => listener.set_nonblocking(true),
            #[cfg(unix)]
            Self::Unix { listener, .. } => listener.set_nonblocking(true),
        }
    }

    /// Accepts one pending client, or `None` when nobody is waiting.
    ///
    /// Accepted streams are switched back to blocking mode for the handler.
    fn poll(&self) -> io::Result<Option<ConnectionStream>> {
        let accepted = match self {
            Self::Tcp(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Tcp(stream))
            }),
            #[cfg(unix)]
            Self::Unix { listener, .. } => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Unix(stream))
            }),
        };
        match accepted {
            Ok(stream) => Ok(Some(stream)),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        }
    }
}

#[cfg(unix)]
impl Drop for Acceptor {
    fn drop(&mut self) {
        if let Self::Unix { path, .. } = self {
            unix::unlink(path);
        }
    }
}

/// Binds the first resolved address that accepts, reporting the last refusal.
fn bind_first_address(
    endpoint: &SocketEndpoint,
    host: &str,
    port: u16,
) -> Result<TcpListener, ListenerError> {
    let candidates = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            endpoint: endpoint.to_string(),
            source,
        })?;

    let mut refusal = None;
    for addr in candidates {
        match TcpListener::bind(addr) {
            Ok(listener) => return Ok(listener),
            Err(source) => refusal = Some(source),
        }
    }
    Err(match refusal {
        Some(source) => ListenerError::Bind {
            endpoint: endpoint.to_string(),
            source,
        },
        None => ListenerError::NoAddress {
            endpoint: endpoint.to_string(),
        },
    })
}

#[cfg(unix)]
mod unix {
    use std::fs;
    use std::io;
    use std::os::unix::fs::FileTypeExt;
    use std::os::unix::net::UnixStream;
    use std::path::Path;

    use tracing::warn;

    use super::{LISTENER_TARGET, ListenerError};

    /// Clears a socket file left behind by a process that no longer listens.
    ///
    /// A missing path is fine. A live listener or a non-socket file is not.
    pub(super) fn reclaim(path: &Path) -> Result<(), ListenerError> {
        let stale = |source| ListenerError::StaleSocket {
            path: path.display().to_string(),
            source,
        };
        let file_type = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata.file_type(),
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(error) => return Err(stale(error)),
        };
        if !file_type.is_socket() {
            return Err(ListenerError::NotASocket {
                path: path.display().to_string(),
            });
        }
        match UnixStream::connect(path) {
            Ok(_) => Err(ListenerError::InUse {
                endpoint: path.display().to_string(),
            }),
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
                ) =>
            {
                fs::remove_file(path).map_err(stale)
            }
            Err(error) => Err(stale(error)),
        }
    }

    pub(super) fn unlink(path: &Path) {
        match fs::remove_file(path) {
            Err(error) if error.kind() != io::ErrorKind::NotFound => {
                warn!(
                    target: LISTENER_TARGET,
                    path = %path.display(),
                    %error,
                    "could not remove socket file"
                );
            }
            _ => {}
        }
    }
}
