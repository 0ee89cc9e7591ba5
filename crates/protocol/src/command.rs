//! Command opcodes
//!
//! Every frame carries a two-byte opcode directly after the leading magic byte.
//! The opcode selects how the peripheral interprets the payload.

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Two-byte command opcode, stored in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command(pub [u8; 2]);

impl Command {
    /// Connection handshake (`POST conn 1`)
    pub const HANDSHAKE: Command = Command([0x00, 0x35]);

    /// Display configuration push (`POST config 1`)
    pub const CONFIG: Command = Command([0x02, 0xBF]);

    /// Telemetry push (`STATE all 1`)
    ///
    /// The low byte has also been observed as 0xEE and 0xEF on captured traffic.
    /// The condition that selects between them is unknown, so the session takes
    /// the telemetry opcode from configuration and this is only the default.
    pub const TELEMETRY: Command = Command([0x02, 0xED]);

    /// Build a command from its big-endian numeric form (`0x02ED`)
    pub const fn from_u16(value: u16) -> Self {
        Command(value.to_be_bytes())
    }

    /// Numeric form of the opcode
    pub const fn as_u16(self) -> u16 {
        u16::from_be_bytes(self.0)
    }

    /// Raw wire bytes
    pub fn as_bytes(&self) -> &[u8; 2] {
        &self.0
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.as_u16())
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    /// Parse `0x02ED` / `0X02ed` style hex opcodes
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| ProtocolError::InvalidCommand(s.to_string()))?;

        if hex.is_empty() || hex.len() > 4 {
            return Err(ProtocolError::InvalidCommand(s.to_string()));
        }

        u16::from_str_radix(hex, 16)
            .map(Command::from_u16)
            .map_err(|_| ProtocolError::InvalidCommand(s.to_string()))
    }
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Command {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
