//! Configurations and loaders for bootstrap scenarios.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};

use jobwire_config::{Config, SocketEndpoint};

use crate::bootstrap::ConfigLoader;

/// Both endpoints on ephemeral loopback ports, so scenarios never collide.
#[must_use]
pub fn loopback_config() -> Config {
    let ephemeral = SocketEndpoint::tcp("127.0.0.1", 0);
    Config {
        rpc_socket: ephemeral.clone(),
        batch_socket: ephemeral,
        ..Config::default()
    }
}

/// Resolves the real layers with an RPC flag no endpoint parser accepts.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(["jobwired", "--rpc-socket", "invalid://socket"].map(OsString::from))
    }
}
