//! # Peer Session
//!
//! Fixed-cadence driver for one simulated peer. Every tick:
//!
//! ```text
//!   start_tick ─▶ drain transport ─▶ end_of_tick ─▶ answer? ─▶ sleep
//!                 (until empty)                     heartbeat
//!                                                   + PLATFORM_INFO
//! ```
//!
//! The session answers only on ticks where the coordinator's heartbeat
//! arrived, so a silent coordinator never receives traffic from the peer.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use quanta::Instant;
use tracing::{debug, info, warn};

use crate::config::PeerConfig;
use crate::liveness::{ConnectionState, LinkEvent, LinkMonitor, Observation};
use crate::position::{PlatformPosition, PositionWalk};
use crate::stats::SessionStats;
use crate::transport::Transport;
use crate::wire::Message;

/// Longest uninterrupted sleep between shutdown checks.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Outcome of a single [`PeerSession::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// 1-based tick index.
    pub tick: u64,
    /// Datagrams drained this tick.
    pub datagrams: usize,
    /// Heartbeats among them.
    pub heartbeats: usize,
    /// Link transitions, in order.
    pub events: Vec<LinkEvent>,
    /// Whether the heartbeat (and telemetry) went out.
    pub transmitted: bool,
    /// State after end-of-tick evaluation.
    pub state: ConnectionState,
}

/// One peer: its link monitor, transport and telemetry source.
pub struct PeerSession<T: Transport> {
    config: PeerConfig,
    monitor: LinkMonitor,
    transport: T,
    /// Present only for roles that emit telemetry.
    walk: Option<PositionWalk>,
    stats: SessionStats,
    recv_buf: Vec<u8>,
}

impl<T: Transport> PeerSession<T> {
    pub fn new(config: PeerConfig, transport: T) -> Self {
        let monitor =
            LinkMonitor::with_limit(config.expected_token.clone(), config.missed_heartbeat_limit);
        let walk = config
            .emits_telemetry
            .then(|| match config.telemetry_seed {
                Some(seed) => PositionWalk::new(config.initial_position, seed),
                None => PositionWalk::unseeded(config.initial_position),
            });
        let recv_buf = vec![0u8; config.recv_buffer_size.max(1)];

        PeerSession {
            config,
            monitor,
            transport,
            walk,
            stats: SessionStats::new(),
            recv_buf,
        }
    }

    /// Run one tick: drain, evaluate, answer.
    pub fn tick(&mut self) -> TickReport {
        self.stats.ticks += 1;
        let mut report = TickReport {
            tick: self.stats.ticks,
            datagrams: 0,
            heartbeats: 0,
            events: Vec::new(),
            transmitted: false,
            state: self.monitor.state(),
        };

        self.monitor.start_tick();
        self.drain(&mut report);

        let silent = self.monitor.is_connected() && !self.monitor.heartbeat_pending();
        if silent {
            self.stats.silent_ticks += 1;
        }
        if let Some(event) = self.monitor.end_of_tick() {
            self.stats.losses += 1;
            info!(
                role = %self.config.role,
                missed = self.monitor.limit(),
                "lost connection with coordinator"
            );
            report.events.push(event);
        }

        if self.monitor.should_transmit() {
            self.transmit();
            report.transmitted = true;
        }

        report.state = self.monitor.state();
        report
    }

    /// Receive until the transport reports nothing pending.
    fn drain(&mut self, report: &mut TickReport) {
        loop {
            let (len, from) = match self.transport.try_recv(&mut self.recv_buf) {
                Ok(Some(received)) => received,
                Ok(None) => break,
                Err(e) => {
                    self.stats.recv_errors += 1;
                    warn!(role = %self.config.role, error = %e, "receive failed");
                    break;
                }
            };

            let payload = &self.recv_buf[..len];
            report.datagrams += 1;
            self.stats.datagrams_received += 1;
            self.stats.bytes_received += len as u64;

            let observation = self.monitor.on_message(payload);
            if !matches!(observation, Observation::Undecodable) {
                debug!(
                    role = %self.config.role,
                    %from,
                    payload = %String::from_utf8_lossy(payload),
                    "received from coordinator"
                );
            }

            match observation {
                Observation::FirstContact => {
                    self.stats.heartbeats_received += 1;
                    self.stats.connects += 1;
                    report.heartbeats += 1;
                    report.events.push(LinkEvent::Connected);
                    info!(role = %self.config.role, %from, "connected to coordinator");
                }
                Observation::Heartbeat => {
                    self.stats.heartbeats_received += 1;
                    report.heartbeats += 1;
                }
                Observation::Other => {}
                Observation::Undecodable => {
                    self.stats.undecodable += 1;
                    debug!(role = %self.config.role, %from, len, "ignoring non-text payload");
                }
            }
        }
    }

    /// Send the own heartbeat, then telemetry for roles that carry it.
    fn transmit(&mut self) {
        let dest = self.config.coordinator;
        send(
            &mut self.transport,
            &mut self.stats,
            self.config.heartbeat_token.as_bytes(),
            dest,
        );

        if let Some(walk) = self.walk.as_mut() {
            let report = Message::PlatformInfo(walk.step()).encode();
            if send(&mut self.transport, &mut self.stats, report.as_bytes(), dest) {
                self.stats.telemetry_sent += 1;
            }
        }
    }

    /// Tick until `running` clears, aligning ticks to `tick_interval`
    /// boundaries.
    pub fn run(&mut self, running: &AtomicBool) {
        let interval = self.config.tick_interval;
        info!(
            role = %self.config.role,
            coordinator = %self.config.coordinator,
            expecting = self.monitor.expected_token(),
            interval_ms = interval.as_millis() as u64,
            "waiting for initial coordinator heartbeat"
        );

        let mut next = Instant::now();
        while running.load(Ordering::Relaxed) {
            self.tick();

            next += interval;
            let now = Instant::now();
            if next < now {
                debug!(
                    overrun_us = now.duration_since(next).as_micros() as u64,
                    "tick overran its interval"
                );
                next = now;
            }
            sleep_until(next, running);
        }
    }

    /// Release the transport and return the final counters.
    pub fn shutdown(self) -> SessionStats {
        let PeerSession {
            config,
            monitor,
            transport,
            stats,
            ..
        } = self;
        drop(transport);
        info!(
            role = %config.role,
            state = monitor.state().as_str(),
            ticks = stats.ticks,
            answer_ratio = stats.answer_ratio(),
            connects = stats.connects,
            losses = stats.losses,
            "session closed"
        );
        stats
    }

    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    pub fn monitor(&self) -> &LinkMonitor {
        &self.monitor
    }

    pub fn state(&self) -> ConnectionState {
        self.monitor.state()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Next telemetry position, if this role emits telemetry.
    pub fn position(&self) -> Option<PlatformPosition> {
        self.walk.as_ref().map(PositionWalk::position)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

/// Fire-and-forget send. Failures are logged and counted only.
fn send<T: Transport>(
    transport: &mut T,
    stats: &mut SessionStats,
    payload: &[u8],
    dest: SocketAddr,
) -> bool {
    match transport.send_to(payload, dest) {
        Ok(_) => {
            stats.messages_sent += 1;
            debug!(%dest, message = %String::from_utf8_lossy(payload), "sent");
            true
        }
        Err(e) => {
            stats.send_failures += 1;
            warn!(%dest, error = %e, "send failed");
            false
        }
    }
}

/// Sleep until `deadline` in short slices, returning early on shutdown.
fn sleep_until(deadline: Instant, running: &AtomicBool) {
    while running.load(Ordering::Relaxed) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }
        std::thread::sleep(remaining.min(SHUTDOWN_POLL));
    }
}
