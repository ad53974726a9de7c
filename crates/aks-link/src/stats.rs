//! # Session Statistics
//!
//! Counters accumulated by a [`PeerSession`](crate::session::PeerSession)
//! over its lifetime. Serializable for the shutdown summary.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Ticks executed.
    pub ticks: u64,
    /// Datagrams drained from the transport.
    pub datagrams_received: u64,
    /// Bytes drained from the transport.
    pub bytes_received: u64,
    /// Datagrams matching the expected heartbeat token.
    pub heartbeats_received: u64,
    /// Datagrams that were not UTF-8 text.
    pub undecodable: u64,
    /// Receive errors other than "would block".
    pub recv_errors: u64,
    /// Datagrams sent (heartbeats and telemetry).
    pub messages_sent: u64,
    /// Telemetry datagrams sent.
    pub telemetry_sent: u64,
    /// Sends that failed at the socket.
    pub send_failures: u64,
    /// Connected ticks without a heartbeat.
    pub silent_ticks: u64,
    /// First-contact transitions.
    pub connects: u64,
    /// Loss transitions.
    pub losses: u64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of ticks on which a heartbeat was answered.
    pub fn answer_ratio(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            let answered = self.messages_sent.saturating_sub(self.telemetry_sent);
            answered as f64 / self.ticks as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_ratio_ignores_telemetry() {
        let stats = SessionStats {
            ticks: 10,
            messages_sent: 8,
            telemetry_sent: 4,
            ..Default::default()
        };
        assert!((stats.answer_ratio() - 0.4).abs() < 1e-12);
        assert_eq!(SessionStats::new().answer_ratio(), 0.0);
    }
}
