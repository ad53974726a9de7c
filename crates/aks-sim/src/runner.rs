//! Process-level wiring around a [`PeerSession`].

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use aks_link::config::PeerConfig;
use aks_link::session::PeerSession;
use aks_link::stats::SessionStats;
use aks_link::transport::{Transport, UdpTransport};

/// Environment variable naming an optional TOML override file.
pub const CONFIG_ENV: &str = "AKS_SIM_CONFIG";

/// Apply the file named by [`CONFIG_ENV`], if set, on top of `preset`.
pub fn load_config(preset: PeerConfig) -> anyhow::Result<PeerConfig> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => load_config_from(preset, Path::new(&path)),
        None => Ok(preset),
    }
}

pub fn load_config_from(preset: PeerConfig, path: &Path) -> anyhow::Result<PeerConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = preset
        .with_toml_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    info!(path = %path.display(), "loaded config overrides");
    Ok(config)
}

/// Bind the peer socket and run until Ctrl-C.
pub fn run_peer(config: PeerConfig) -> anyhow::Result<SessionStats> {
    let transport = UdpTransport::bind(config.bind).context("binding peer socket")?;
    info!(
        role = %config.role,
        bind = %config.bind,
        telemetry = config.emits_telemetry,
        "simulator running"
    );

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            info!("shutting down...");
            running.store(false, Ordering::Relaxed);
        })
        .context("installing interrupt handler")?;
    }

    Ok(run_until(config, transport, &running))
}

/// Drive a session over `transport` until `running` clears, then release
/// the transport and log the final counters.
pub fn run_until<T: Transport>(
    config: PeerConfig,
    transport: T,
    running: &AtomicBool,
) -> SessionStats {
    let mut session = PeerSession::new(config, transport);
    session.run(running);
    let stats = session.shutdown();

    match serde_json::to_string(&stats) {
        Ok(json) => info!(stats = %json, "simulator stopped"),
        Err(e) => warn!(error = %e, "failed to serialize stats"),
    }
    stats
}
