//! Wiring of the registry, dispatcher, backend, and both listeners.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use jobwire_config::{Config, SocketEndpoint};

use crate::batch::BatchConnectionHandler;
use crate::dispatch::{Dispatcher, RpcConnectionHandler};
use crate::executor::{ExecutionBackend, ThreadBackend};
use crate::operations::{StandardCatalogue, WorkloadCatalogue};
use crate::registry::JobRegistry;
use crate::transport::{ListenerError, ListenerHandle, SocketListener};

const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Collaborators shared by every RPC connection.
#[derive(Clone)]
pub struct Services {
    /// Handle allocator and outcome store.
    pub registry: Arc<JobRegistry>,
    /// Runs admitted jobs.
    pub backend: Arc<dyn ExecutionBackend>,
    /// Supplies the workload for each submission.
    pub catalogue: Arc<dyn WorkloadCatalogue>,
}

impl Services {
    /// Production collaborators: a registry shaped by `config`, one thread per
    /// job, and the built-in workloads.
    #[must_use]
    pub fn standard(config: &Config) -> Self {
        let registry = Arc::new(
            JobRegistry::new(config.first_job_handle()).with_retention(config.retained_outcomes()),
        );
        let backend = Arc::new(ThreadBackend::new(Arc::clone(&registry)));
        Self {
            registry,
            backend,
            catalogue: Arc::new(StandardCatalogue),
        }
    }
}

/// Errors raised while starting the listeners.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A listener could not be bound or started.
    #[error("failed to start {role} listener on {endpoint}: {source}")]
    Listener {
        /// `rpc` or `batch`.
        role: &'static str,
        /// Endpoint that failed.
        endpoint: SocketEndpoint,
        /// Underlying listener failure.
        #[source]
        source: ListenerError,
    },
    /// A listener thread panicked while shutting down.
    #[error("listener shutdown failed: {source}")]
    Shutdown {
        /// Underlying listener failure.
        #[source]
        source: ListenerError,
    },
}

/// Running RPC and batch listeners.
#[derive(Debug)]
pub struct Server {
    rpc: ListenerHandle,
    batch: ListenerHandle,
    rpc_addr: Option<SocketAddr>,
    batch_addr: Option<SocketAddr>,
    registry: Arc<JobRegistry>,
}

impl Server {
    /// Binds both configured endpoints and starts accepting connections.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Listener`] when either endpoint cannot be bound.
    /// Nothing is left listening on failure.
    pub fn start(config: &Config, services: Services) -> Result<Self, ServerError> {
        let Services {
            registry,
            backend,
            catalogue,
        } = services;

        let rpc_listener = bind("rpc", config.rpc_socket())?;
        let batch_listener = bind("batch", config.batch_socket())?;
        let rpc_addr = rpc_listener.local_addr();
        let batch_addr = batch_listener.local_addr();

        let dispatcher = Dispatcher::new(Arc::clone(&registry), catalogue);
        let rpc_handler =
            Arc::new(RpcConnectionHandler::new(dispatcher, backend).with_mode(config.rpc_mode()));
        let rpc = rpc_listener
            .start(rpc_handler)
            .map_err(|source| listener_error("rpc", config.rpc_socket(), source))?;
        let batch = match batch_listener.start(Arc::new(BatchConnectionHandler)) {
            Ok(handle) => handle,
            Err(source) => {
                rpc.shutdown();
                let _ = rpc.join();
                return Err(listener_error("batch", config.batch_socket(), source));
            }
        };

        info!(
            target: SERVER_TARGET,
            rpc = %config.rpc_socket(),
            mode = %config.rpc_mode(),
            batch = %config.batch_socket(),
            "server accepting connections"
        );
        Ok(Self {
            rpc,
            batch,
            rpc_addr,
            batch_addr,
            registry,
        })
    }

    /// Bound address of the RPC listener when it uses TCP.
    #[must_use]
    pub fn rpc_addr(&self) -> Option<SocketAddr> {
        self.rpc_addr
    }

    /// Bound address of the batch listener when it uses TCP.
    #[must_use]
    pub fn batch_addr(&self) -> Option<SocketAddr> {
        self.batch_addr
    }

    /// Registry shared with the RPC connections.
    #[must_use]
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Stops accepting connections and waits for both listeners to exit.
    ///
    /// Connections already accepted and jobs already running finish on their
    /// own threads.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Shutdown`] if a listener thread panicked.
    pub fn shutdown(self) -> Result<(), ServerError> {
        self.rpc.shutdown();
        self.batch.shutdown();
        let rpc = self.rpc.join();
        let batch = self.batch.join();
        rpc.and(batch)
            .map_err(|source| ServerError::Shutdown { source })?;
        info!(target: SERVER_TARGET, "server stopped");
        Ok(())
    }
}

fn bind(role: &'static str, endpoint: &SocketEndpoint) -> Result<SocketListener, ServerError> {
    SocketListener::bind(role, endpoint).map_err(|source| listener_error(role, endpoint, source))
}

fn listener_error(role: &'static str, endpoint: &SocketEndpoint, source: ListenerError) -> ServerError {
    ServerError::Listener {
        role,
        endpoint: endpoint.clone(),
        source,
    }
}
