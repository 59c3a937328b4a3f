//! Shared doubles and helpers for the behavioural suites.

mod backend;
mod client;
mod config_loader;
mod reporter;
mod shutdown;

pub use backend::GatedBackend;
pub use client::{exchange, exchange_lines};
pub use config_loader::{FailingConfigLoader, loopback_config};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use shutdown::TestShutdownSignal;
