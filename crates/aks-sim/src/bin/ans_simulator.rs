//! # ANS Simulator
//!
//! Aerial navigation sensor peer. Binds `127.0.0.1:5001`, waits for the
//! coordinator's `AKS_HEARTBEAT` on `127.0.0.1:5000`, and answers each one
//! with `ANS_HEARTBEAT` followed by a `PLATFORM_INFO` position report.
//!
//! ## Usage
//!
//! ```bash
//! ans-simulator
//!
//! # Overrides and verbose logging
//! AKS_SIM_CONFIG=ans.toml RUST_LOG=debug ans-simulator
//! ```

use aks_link::config::PeerConfig;

fn main() -> anyhow::Result<()> {
    aks_sim::logging::init();
    let config = aks_sim::load_config(PeerConfig::ans())?;
    aks_sim::run_peer(config)?;
    Ok(())
}
