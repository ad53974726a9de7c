//! AKS peer simulators.
//!
//! Shared startup for the `ans-simulator` and `launcher-simulator`
//! binaries: logging, optional TOML overrides, interrupt handling and the
//! session loop from `aks-link`.

pub mod logging;
pub mod runner;

pub use runner::{load_config, run_peer, CONFIG_ENV};
