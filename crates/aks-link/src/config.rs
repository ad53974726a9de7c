//! # Peer Configuration
//!
//! Each simulated role is one [`PeerConfig`] preset. A TOML document can
//! override individual fields; everything in it is optional.
//!
//! ```toml
//! version = 1
//! bind = "127.0.0.1:5001"
//! coordinator = "127.0.0.1:5000"
//! tick_interval_ms = 1000
//! missed_heartbeat_limit = 5
//! telemetry_seed = 42
//!
//! [position]
//! latitude = 0.0
//! longitude = 0.0
//! altitude = 10.0
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::liveness::MISSED_HEARTBEAT_LIMIT;
use crate::position::{PlatformPosition, LATITUDE_RANGE, LONGITUDE_RANGE};
use crate::wire::{Role, MAX_DATAGRAM_LEN};

pub const CONFIG_VERSION: u32 = 1;

/// All roles share one host.
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported config version {0}")]
    UnsupportedVersion(u32),
    #[error("invalid {field} address '{value}'")]
    Address { field: &'static str, value: String },
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
}

// ─── Input (TOML) ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeerConfigInput {
    pub version: u32,
    pub bind: Option<String>,
    pub coordinator: Option<String>,
    pub tick_interval_ms: Option<u64>,
    pub missed_heartbeat_limit: Option<u32>,
    pub recv_buffer_size: Option<usize>,
    pub telemetry_seed: Option<u64>,
    pub position: PositionInput,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PositionInput {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
}

// ─── Resolved ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PeerConfig {
    pub role: Role,
    /// Local endpoint the peer binds.
    pub bind: SocketAddr,
    /// Where heartbeats and telemetry are sent.
    pub coordinator: SocketAddr,
    /// Token this peer sends.
    pub heartbeat_token: String,
    /// Token this peer accepts as the coordinator's heartbeat.
    pub expected_token: String,
    /// Send `PLATFORM_INFO` alongside each heartbeat.
    pub emits_telemetry: bool,
    pub tick_interval: Duration,
    pub missed_heartbeat_limit: u32,
    /// Bytes read per receive call.
    pub recv_buffer_size: usize,
    pub initial_position: PlatformPosition,
    /// Fixed seed for the altitude walk; random when unset.
    pub telemetry_seed: Option<u64>,
}

impl PeerConfig {
    /// Aerial navigation sensor platform: port 5001, sends telemetry.
    pub fn ans() -> Self {
        Self::preset(Role::Ans, true)
    }

    /// Launch-control platform: port 5002, heartbeat only.
    pub fn launcher() -> Self {
        Self::preset(Role::Launcher, false)
    }

    fn preset(role: Role, emits_telemetry: bool) -> Self {
        PeerConfig {
            role,
            bind: SocketAddr::new(DEFAULT_HOST, role.default_port()),
            coordinator: SocketAddr::new(DEFAULT_HOST, Role::Aks.default_port()),
            heartbeat_token: role.heartbeat_token().to_string(),
            expected_token: Role::Aks.heartbeat_token().to_string(),
            emits_telemetry,
            tick_interval: DEFAULT_TICK_INTERVAL,
            missed_heartbeat_limit: MISSED_HEARTBEAT_LIMIT,
            recv_buffer_size: MAX_DATAGRAM_LEN,
            initial_position: PlatformPosition::default(),
            telemetry_seed: None,
        }
    }

    /// Apply a TOML override document to `self`. Empty input changes nothing.
    pub fn with_toml_str(self, input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(self);
        }
        let parsed: PeerConfigInput = toml::from_str(input)?;
        parsed.resolve(self)
    }
}

impl PeerConfigInput {
    pub fn resolve(self, base: PeerConfig) -> Result<PeerConfig, ConfigError> {
        let version = if self.version == 0 {
            CONFIG_VERSION
        } else {
            self.version
        };
        if version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(version));
        }

        let bind = match self.bind {
            Some(value) => parse_addr("bind", &value)?,
            None => base.bind,
        };
        let coordinator = match self.coordinator {
            Some(value) => parse_addr("coordinator", &value)?,
            None => base.coordinator,
        };

        let tick_interval = match self.tick_interval_ms {
            Some(0) => return Err(out_of_range("tick_interval_ms", 0)),
            Some(ms) => Duration::from_millis(ms),
            None => base.tick_interval,
        };
        let missed_heartbeat_limit = match self.missed_heartbeat_limit {
            Some(0) => return Err(out_of_range("missed_heartbeat_limit", 0)),
            Some(limit) => limit,
            None => base.missed_heartbeat_limit,
        };
        let recv_buffer_size = match self.recv_buffer_size {
            Some(0) => return Err(out_of_range("recv_buffer_size", 0)),
            Some(size) => size,
            None => base.recv_buffer_size,
        };

        let start = base.initial_position;
        let initial_position = PlatformPosition {
            latitude: self.position.latitude.unwrap_or(start.latitude),
            longitude: self.position.longitude.unwrap_or(start.longitude),
            altitude: self.position.altitude.unwrap_or(start.altitude),
        };
        if !(0.0..LATITUDE_RANGE).contains(&initial_position.latitude) {
            return Err(out_of_range("latitude", initial_position.latitude));
        }
        if !(0.0..LONGITUDE_RANGE).contains(&initial_position.longitude) {
            return Err(out_of_range("longitude", initial_position.longitude));
        }
        if !initial_position.altitude.is_finite() {
            return Err(out_of_range("altitude", initial_position.altitude));
        }

        Ok(PeerConfig {
            bind,
            coordinator,
            tick_interval,
            missed_heartbeat_limit,
            recv_buffer_size,
            initial_position,
            telemetry_seed: self.telemetry_seed.or(base.telemetry_seed),
            ..base
        })
    }
}

/// Accepts `ip:port` or `host:port`; hostnames resolve to their first address.
fn parse_addr(field: &'static str, value: &str) -> Result<SocketAddr, ConfigError> {
    let value = value.trim();
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Ok(addr);
    }
    value
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| ConfigError::Address {
            field,
            value: value.to_string(),
        })
}

fn out_of_range(field: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::OutOfRange {
        field,
        value: value.to_string(),
    }
}
