//! # Launcher Simulator
//!
//! Launch-control peer. Binds `127.0.0.1:5002` and answers each
//! `AKS_HEARTBEAT` from `127.0.0.1:5000` with `LAUNCHER_HEARTBEAT`.
//!
//! ## Usage
//!
//! ```bash
//! launcher-simulator
//! AKS_SIM_CONFIG=launcher.toml launcher-simulator
//! ```

use aks_link::config::PeerConfig;

fn main() -> anyhow::Result<()> {
    aks_sim::logging::init();
    let config = aks_sim::load_config(PeerConfig::launcher())?;
    aks_sim::run_peer(config)?;
    Ok(())
}
