//! # aks-link
//!
//! Heartbeat link liveness for peers of the AKS coordinator.
//!
//! A peer polls an unreliable datagram channel once per tick, tracks
//! whether the coordinator is alive from its heartbeat token, and only
//! answers (own heartbeat, plus telemetry for the sensor platform) on
//! ticks where fresh evidence of liveness arrived.
//!
//! ## Crate structure
//!
//! - [`wire`] — Heartbeat tokens, `PLATFORM_INFO` telemetry text format
//! - [`liveness`] — Connected/disconnected state machine, missed-tick counting
//! - [`position`] — Simulated platform position and its per-tick walk
//! - [`transport`] — Non-blocking datagram transport trait, UDP implementation
//! - [`config`] — Per-role peer configuration, TOML overrides
//! - [`stats`] — Session counters
//! - [`session`] — Periodic driver tying the monitor to the transport

pub mod config;
pub mod liveness;
pub mod position;
pub mod session;
pub mod stats;
pub mod transport;
pub mod wire;
