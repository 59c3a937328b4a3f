//! Where a listener binds and a client connects.

use std::fmt;
use std::io;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use url::Url;

/// A TCP address or a Unix domain socket path.
///
/// Text form is `tcp://host:port` or `unix:///absolute/path`. Configuration
/// files may use either that text or a table tagged with `transport`:
///
/// ```toml
/// rpc_socket = "tcp://127.0.0.1:8080"
/// batch_socket = { transport = "unix", path = "/run/jobwire/batch.sock" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEndpoint {
    /// Unix domain socket at `path`.
    Unix {
        /// Socket file location.
        path: Utf8PathBuf,
    },
    /// TCP socket on `host:port`. Port zero asks for an ephemeral port.
    Tcp {
        /// Name or literal address.
        host: String,
        /// Port number.
        port: u16,
    },
}

impl SocketEndpoint {
    /// Endpoint for the Unix socket at `path`.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Endpoint for `host:port` over TCP.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Socket file location, or `None` for TCP.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        if let Self::Unix { path } = self {
            Some(path.as_path())
        } else {
            None
        }
    }

    /// Creates the directory a Unix socket will live in.
    ///
    /// New directories get mode `0700` on Unix. Existing directories are
    /// left untouched and TCP endpoints are a no-op.
    ///
    /// # Errors
    ///
    /// Fails when the path is a bare file name or the directory cannot be
    /// created.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        match self.unix_path() {
            None => Ok(()),
            Some(path) => match path.parent() {
                Some(parent) if !parent.as_str().is_empty() => create_private_dir(parent),
                _ => Err(SocketPreparationError::MissingParent {
                    path: path.to_owned(),
                }),
            },
        }
    }
}

fn create_private_dir(dir: &Utf8Path) -> Result<(), SocketPreparationError> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    std::os::unix::fs::DirBuilderExt::mode(&mut builder, 0o700);

    match builder.create(dir) {
        Err(source) if source.kind() != io::ErrorKind::AlreadyExists => {
            Err(SocketPreparationError::CreateDirectory {
                path: dir.to_owned(),
                source,
            })
        }
        _ => Ok(()),
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } => write!(formatter, "tcp://{host}:{port}"),
            Self::Unix { path } => write!(formatter, "unix://{path}"),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let reject = |problem| SocketParseError {
            input: input.to_owned(),
            problem,
        };
        let url = Url::parse(input).map_err(|error| reject(EndpointProblem::NotAUrl(error)))?;
        match url.scheme() {
            "tcp" => {
                let host = url.host_str().ok_or(EndpointProblem::NoHost).map_err(reject)?;
                let port = url.port().ok_or(EndpointProblem::NoPort).map_err(reject)?;
                Ok(Self::tcp(host, port))
            }
            "unix" if url.path().is_empty() => Err(reject(EndpointProblem::NoPath)),
            "unix" => Ok(Self::unix(url.path())),
            scheme => Err(reject(EndpointProblem::Scheme(scheme.to_owned()))),
        }
    }
}

impl Serialize for SocketEndpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SocketEndpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Written {
            Text(String),
            Table(Tagged),
        }

        #[derive(Deserialize)]
        #[serde(tag = "transport", rename_all = "snake_case")]
        enum Tagged {
            Unix { path: Utf8PathBuf },
            Tcp { host: String, port: u16 },
        }

        match Written::deserialize(deserializer)? {
            Written::Text(text) => text.parse().map_err(D::Error::custom),
            Written::Table(Tagged::Unix { path }) => Ok(Self::Unix { path }),
            Written::Table(Tagged::Tcp { host, port }) => Ok(Self::Tcp { host, port }),
        }
    }
}

/// Text that does not describe a [`SocketEndpoint`].
#[derive(Debug, Error)]
#[error("invalid socket endpoint '{input}': {problem}")]
pub struct SocketParseError {
    input: String,
    #[source]
    problem: EndpointProblem,
}

impl SocketParseError {
    /// The rejected text.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Why it was rejected.
    #[must_use]
    pub fn problem(&self) -> &EndpointProblem {
        &self.problem
    }
}

/// The part of an endpoint string that was wrong.
#[derive(Debug, Error)]
pub enum EndpointProblem {
    /// Not a URL at all.
    #[error("{0}")]
    NotAUrl(url::ParseError),
    /// A scheme other than `tcp` or `unix`.
    #[error("unsupported scheme '{0}'")]
    Scheme(String),
    /// `tcp://` without a host.
    #[error("missing TCP host")]
    NoHost,
    /// `tcp://` without a port.
    #[error("missing TCP port")]
    NoPort,
    /// `unix://` without a path.
    #[error("missing Unix socket path")]
    NoPath,
}

/// Failure to create a Unix socket's directory.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// The path names a file in the working directory.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent {
        /// Configured socket path.
        path: Utf8PathBuf,
    },
    /// The directory could not be created.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        /// Directory being created.
        path: Utf8PathBuf,
        /// Filesystem error.
        #[source]
        source: io::Error,
    },
}
