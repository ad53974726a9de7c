//! # Wire Format
//!
//! Plain ASCII text, one message per datagram, no framing.
//!
//! ```text
//! AKS_HEARTBEAT                              coordinator → peer
//! ANS_HEARTBEAT | LAUNCHER_HEARTBEAT         peer → coordinator
//! PLATFORM_INFO,<lat:.6>,<lon:.6>,<alt:.2>   ANS → coordinator
//! ```

use std::fmt;

use thiserror::Error;

use crate::position::PlatformPosition;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Heartbeat token sent by the coordinator.
pub const AKS_HEARTBEAT: &str = "AKS_HEARTBEAT";

/// Heartbeat token sent by the navigation sensor platform.
pub const ANS_HEARTBEAT: &str = "ANS_HEARTBEAT";

/// Heartbeat token sent by the launcher.
pub const LAUNCHER_HEARTBEAT: &str = "LAUNCHER_HEARTBEAT";

/// Leading field of a telemetry message.
pub const PLATFORM_INFO_TAG: &str = "PLATFORM_INFO";

/// Largest datagram read per receive call.
pub const MAX_DATAGRAM_LEN: usize = 1024;

// ─── Role ────────────────────────────────────────────────────────────────────

/// Participant on the link. Each role owns one heartbeat token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The central coordinator.
    Aks,
    /// Aerial navigation sensor platform; emits telemetry.
    Ans,
    /// Launch-control platform.
    Launcher,
}

impl Role {
    pub fn heartbeat_token(&self) -> &'static str {
        match self {
            Role::Aks => AKS_HEARTBEAT,
            Role::Ans => ANS_HEARTBEAT,
            Role::Launcher => LAUNCHER_HEARTBEAT,
        }
    }

    /// Default UDP port each role binds on the shared host.
    pub fn default_port(&self) -> u16 {
        match self {
            Role::Aks => 5000,
            Role::Ans => 5001,
            Role::Launcher => 5002,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Aks => "aks",
            Role::Ans => "ans",
            Role::Launcher => "launcher",
        }
    }

    /// Role whose heartbeat token is exactly `token`.
    pub fn from_heartbeat(token: &str) -> Option<Role> {
        [Role::Aks, Role::Ans, Role::Launcher]
            .into_iter()
            .find(|role| role.heartbeat_token() == token)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8")]
    NotUtf8,
    #[error("PLATFORM_INFO needs 3 fields, got {0}")]
    FieldCount(usize),
    #[error("invalid {field} value '{value}'")]
    InvalidNumber { field: &'static str, value: String },
}

// ─── Message ─────────────────────────────────────────────────────────────────

/// A decoded datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A heartbeat token, identified by its sender.
    Heartbeat(Role),
    /// Telemetry from the navigation sensor platform.
    PlatformInfo(PlatformPosition),
    /// Any other text. Carried through so callers can log it.
    Other(String),
}

impl Message {
    /// Decode a raw datagram.
    ///
    /// Tokens must match exactly; `ans_heartbeat` or `AKS_HEARTBEAT\n` are
    /// [`Message::Other`].
    pub fn decode(raw: &[u8]) -> Result<Message, DecodeError> {
        let text = std::str::from_utf8(raw).map_err(|_| DecodeError::NotUtf8)?;

        if let Some(role) = Role::from_heartbeat(text) {
            return Ok(Message::Heartbeat(role));
        }

        let mut parts = text.split(',');
        if parts.next() == Some(PLATFORM_INFO_TAG) {
            let fields: Vec<&str> = parts.collect();
            if fields.len() != 3 {
                return Err(DecodeError::FieldCount(fields.len()));
            }
            let position = PlatformPosition {
                latitude: parse_field("latitude", fields[0])?,
                longitude: parse_field("longitude", fields[1])?,
                altitude: parse_field("altitude", fields[2])?,
            };
            return Ok(Message::PlatformInfo(position));
        }

        Ok(Message::Other(text.to_string()))
    }

    /// Encode to the text sent on the wire.
    pub fn encode(&self) -> String {
        match self {
            Message::Heartbeat(role) => role.heartbeat_token().to_string(),
            Message::PlatformInfo(pos) => format!(
                "{},{:.6},{:.6},{:.2}",
                PLATFORM_INFO_TAG, pos.latitude, pos.longitude, pos.altitude
            ),
            Message::Other(text) => text.clone(),
        }
    }
}

fn parse_field(field: &'static str, value: &str) -> Result<f64, DecodeError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DecodeError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}
