//! # Link Liveness
//!
//! Tick-driven connection state machine fed by the coordinator's heartbeat.
//!
//! ```text
//!                 heartbeat (first contact)
//!   Disconnected ───────────────────────────▶ Connected
//!        ▲                                        │
//!        └──── `limit` consecutive silent ticks ──┘
//! ```
//!
//! Each tick is bracketed by [`LinkMonitor::start_tick`] and
//! [`LinkMonitor::end_of_tick`]; every datagram drained in between goes
//! through [`LinkMonitor::on_message`]. Outbound traffic is gated by
//! [`LinkMonitor::should_transmit`], which requires a heartbeat in the
//! current tick and not just a `Connected` state.

use tracing::debug;

/// Consecutive silent ticks after which the link is declared lost.
pub const MISSED_HEARTBEAT_LIMIT: u32 = 5;

/// Link state as seen by the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
        }
    }
}

/// Classification of one inbound datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Heartbeat that moved the link from `Disconnected` to `Connected`.
    FirstContact,
    /// Heartbeat on an already connected link.
    Heartbeat,
    /// Valid text that is not the expected heartbeat token.
    Other,
    /// Payload that is not UTF-8 text. Ignored.
    Undecodable,
}

impl Observation {
    pub fn is_heartbeat(&self) -> bool {
        matches!(self, Observation::FirstContact | Observation::Heartbeat)
    }
}

/// Edge-triggered link transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// First heartbeat after startup or after a loss.
    Connected,
    /// Missed-tick limit reached.
    Lost,
}

/// Single source of truth for link liveness.
#[derive(Debug, Clone)]
pub struct LinkMonitor {
    /// Token the remote side sends as its heartbeat.
    expected: String,
    /// Consecutive silent ticks tolerated before loss.
    limit: u32,
    state: ConnectionState,
    missed: u32,
    heartbeat_pending: bool,
}

impl LinkMonitor {
    /// Monitor for `expected` with the standard limit of
    /// [`MISSED_HEARTBEAT_LIMIT`] silent ticks.
    pub fn new(expected: impl Into<String>) -> Self {
        Self::with_limit(expected, MISSED_HEARTBEAT_LIMIT)
    }

    /// A `limit` of 0 is treated as 1.
    pub fn with_limit(expected: impl Into<String>, limit: u32) -> Self {
        LinkMonitor {
            expected: expected.into(),
            limit: limit.max(1),
            state: ConnectionState::Disconnected,
            missed: 0,
            heartbeat_pending: false,
        }
    }

    /// Begin a tick. Clears the pending-heartbeat flag.
    pub fn start_tick(&mut self) {
        self.heartbeat_pending = false;
    }

    /// Classify an inbound payload and apply heartbeat effects.
    ///
    /// Only an exact byte match with the expected token counts.
    pub fn on_message(&mut self, raw: &[u8]) -> Observation {
        let Ok(text) = std::str::from_utf8(raw) else {
            return Observation::Undecodable;
        };
        if text != self.expected {
            return Observation::Other;
        }

        self.heartbeat_pending = true;
        self.missed = 0;

        match self.state {
            ConnectionState::Disconnected => {
                self.state = ConnectionState::Connected;
                debug!(token = %self.expected, "first contact");
                Observation::FirstContact
            }
            ConnectionState::Connected => Observation::Heartbeat,
        }
    }

    /// Close a tick after all inbound datagrams were processed.
    ///
    /// Silent ticks only count while `Connected`.
    pub fn end_of_tick(&mut self) -> Option<LinkEvent> {
        if self.state != ConnectionState::Connected || self.heartbeat_pending {
            return None;
        }

        self.missed += 1;
        debug!(missed = self.missed, limit = self.limit, "heartbeat missed");

        if self.missed >= self.limit {
            debug!(missed = self.missed, token = %self.expected, "missed-heartbeat limit reached");
            self.state = ConnectionState::Disconnected;
            self.missed = 0;
            return Some(LinkEvent::Lost);
        }
        None
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn missed_count(&self) -> u32 {
        self.missed
    }

    /// Whether a heartbeat arrived during the current tick.
    pub fn heartbeat_pending(&self) -> bool {
        self.heartbeat_pending
    }

    /// Connected and heard from the remote side this tick.
    pub fn should_transmit(&self) -> bool {
        self.is_connected() && self.heartbeat_pending
    }

    pub fn expected_token(&self) -> &str {
        &self.expected
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::AKS_HEARTBEAT;

    /// Run one tick with the given inbound payloads.
    fn tick(mon: &mut LinkMonitor, inbound: &[&[u8]]) -> (Vec<Observation>, Option<LinkEvent>) {
        mon.start_tick();
        let obs = inbound.iter().map(|raw| mon.on_message(raw)).collect();
        let event = mon.end_of_tick();
        (obs, event)
    }

    fn connected() -> LinkMonitor {
        let mut mon = LinkMonitor::new(AKS_HEARTBEAT);
        tick(&mut mon, &[b"AKS_HEARTBEAT"]);
        assert!(mon.is_connected());
        mon
    }

    // ─── First Contact ──────────────────────────────────────────────────

    #[test]
    fn starts_disconnected() {
        let mon = LinkMonitor::new(AKS_HEARTBEAT);
        assert_eq!(mon.state(), ConnectionState::Disconnected);
        assert_eq!(mon.missed_count(), 0);
        assert!(!mon.heartbeat_pending());
        assert!(!mon.should_transmit());
    }

    #[test]
    fn first_heartbeat_connects() {
        let mut mon = LinkMonitor::new(AKS_HEARTBEAT);
        let (obs, event) = tick(&mut mon, &[b"AKS_HEARTBEAT"]);
        assert_eq!(obs, vec![Observation::FirstContact]);
        assert_eq!(event, None);
        assert_eq!(mon.state(), ConnectionState::Connected);
        assert_eq!(mon.missed_count(), 0);
        assert!(mon.should_transmit());
    }

    #[test]
    fn first_contact_is_edge_triggered() {
        let mut mon = LinkMonitor::new(AKS_HEARTBEAT);
        let (obs, _) = tick(&mut mon, &[b"AKS_HEARTBEAT", b"AKS_HEARTBEAT"]);
        assert_eq!(obs, vec![Observation::FirstContact, Observation::Heartbeat]);

        let (obs, _) = tick(&mut mon, &[b"AKS_HEARTBEAT"]);
        assert_eq!(obs, vec![Observation::Heartbeat]);
    }

    #[test]
    fn near_miss_tokens_are_not_heartbeats() {
        let mut mon = LinkMonitor::new(AKS_HEARTBEAT);
        let (obs, _) = tick(
            &mut mon,
            &[
                b"aks_heartbeat",
                b"AKS_HEARTBEAT\n",
                b"AKS_HEART",
                b"ANS_HEARTBEAT",
                b"",
            ],
        );
        assert!(obs.iter().all(|o| *o == Observation::Other));
        assert_eq!(mon.state(), ConnectionState::Disconnected);
        assert!(!mon.heartbeat_pending());
    }

    #[test]
    fn undecodable_payload_has_no_effect() {
        let mut mon = connected();
        tick(&mut mon, &[]);
        assert_eq!(mon.missed_count(), 1);

        let (obs, _) = tick(&mut mon, &[&[0xc3, 0x28]]);
        assert_eq!(obs, vec![Observation::Undecodable]);
        assert_eq!(mon.missed_count(), 2);
        assert!(!mon.heartbeat_pending());
    }

    // ─── Silence Threshold ──────────────────────────────────────────────

    #[test]
    fn four_silent_ticks_stay_connected() {
        let mut mon = connected();
        for expected in 1..=4 {
            let (_, event) = tick(&mut mon, &[]);
            assert_eq!(event, None);
            assert_eq!(mon.missed_count(), expected);
        }
        assert!(mon.is_connected());
    }

    #[test]
    fn fifth_silent_tick_disconnects() {
        let mut mon = connected();
        for _ in 0..4 {
            tick(&mut mon, &[]);
        }
        let (_, event) = tick(&mut mon, &[]);
        assert_eq!(event, Some(LinkEvent::Lost));
        assert_eq!(mon.state(), ConnectionState::Disconnected);
        assert_eq!(mon.missed_count(), 0);
    }

    #[test]
    fn stray_messages_count_as_silence() {
        let mut mon = connected();
        for _ in 0..5 {
            tick(&mut mon, &[b"PLATFORM_INFO,1,2,3", b"hello"]);
        }
        assert_eq!(mon.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn heartbeat_resets_silent_streak() {
        let mut mon = connected();
        for _ in 0..4 {
            tick(&mut mon, &[]);
        }
        tick(&mut mon, &[b"AKS_HEARTBEAT"]);
        assert_eq!(mon.missed_count(), 0);
        for _ in 0..4 {
            let (_, event) = tick(&mut mon, &[]);
            assert_eq!(event, None);
        }
        assert!(mon.is_connected());
        assert_eq!(mon.missed_count(), 4);
    }

    #[test]
    fn disconnected_ticks_do_not_count() {
        let mut mon = LinkMonitor::new(AKS_HEARTBEAT);
        for _ in 0..20 {
            let (_, event) = tick(&mut mon, &[]);
            assert_eq!(event, None);
        }
        assert_eq!(mon.missed_count(), 0);
        assert_eq!(mon.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn reconnects_after_loss() {
        let mut mon = connected();
        for _ in 0..5 {
            tick(&mut mon, &[]);
        }
        assert!(!mon.is_connected());

        let (obs, _) = tick(&mut mon, &[b"AKS_HEARTBEAT"]);
        assert_eq!(obs, vec![Observation::FirstContact]);
        assert!(mon.should_transmit());
    }

    // ─── Gating ─────────────────────────────────────────────────────────

    #[test]
    fn connected_without_heartbeat_does_not_transmit() {
        let mut mon = connected();
        tick(&mut mon, &[]);
        assert!(mon.is_connected());
        assert!(!mon.should_transmit());
    }

    #[test]
    fn pending_flag_cleared_at_tick_start() {
        let mut mon = connected();
        assert!(mon.heartbeat_pending());
        mon.start_tick();
        assert!(!mon.heartbeat_pending());
    }

    #[test]
    fn custom_limit() {
        let mut mon = LinkMonitor::with_limit(AKS_HEARTBEAT, 2);
        tick(&mut mon, &[b"AKS_HEARTBEAT"]);
        assert_eq!(tick(&mut mon, &[]).1, None);
        assert_eq!(tick(&mut mon, &[]).1, Some(LinkEvent::Lost));

        let zero = LinkMonitor::with_limit(AKS_HEARTBEAT, 0);
        assert_eq!(zero.limit(), 1);
    }
}
