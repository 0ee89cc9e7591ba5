//! Logical messages sent to the device
//!
//! A message turns into a frame payload made of the header block followed by
//! an optional compact JSON body. The sequence number and date are supplied by
//! the session at send time.

use crate::command::Command;
use crate::display::ConfigDocument;
use crate::error::Result;
use crate::header::{MessageHeader, VERB_CONFIG, VERB_CONNECT, VERB_STATE};
use crate::telemetry::TelemetrySnapshot;

/// Outbound message kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Connection handshake, header only
    Handshake,
    /// Display configuration and host identification
    Config(ConfigDocument),
    /// One telemetry snapshot
    Telemetry(TelemetrySnapshot),
}

impl Message {
    /// Verb line of the header block
    pub fn verb(&self) -> &'static str {
        match self {
            Message::Handshake => VERB_CONNECT,
            Message::Config(_) => VERB_CONFIG,
            Message::Telemetry(_) => VERB_STATE,
        }
    }

    /// Default opcode for this message kind
    ///
    /// The session overrides the telemetry opcode with its configured value.
    pub fn default_command(&self) -> Command {
        match self {
            Message::Handshake => Command::HANDSHAKE,
            Message::Config(_) => Command::CONFIG,
            Message::Telemetry(_) => Command::TELEMETRY,
        }
    }

    /// Compact JSON body, if this message kind carries one
    pub fn body(&self) -> Result<Option<Vec<u8>>> {
        let body = match self {
            Message::Handshake => None,
            Message::Config(doc) => Some(serde_json::to_vec(doc)?),
            Message::Telemetry(snapshot) => Some(serde_json::to_vec(snapshot)?),
        };
        Ok(body)
    }

    /// Full frame payload: header block followed by the body
    ///
    /// # Example
    /// ```
    /// use protocol::Message;
    ///
    /// let payload = Message::Handshake.payload(0, 1_700_000_000_000).unwrap();
    /// assert_eq!(payload, b"POST conn 1\r\nSeqNumber=0\r\nDate=1700000000000\r\n\r\n");
    /// ```
    pub fn payload(&self, seq: u64, date_ms: u64) -> Result<Vec<u8>> {
        let body = self.body()?;
        let header = MessageHeader {
            verb: self.verb(),
            seq,
            date_ms,
            content_length: body.as_ref().map(Vec::len),
        };

        let mut payload = header.render().into_bytes();
        if let Some(body) = body {
            payload.extend_from_slice(&body);
        }
        Ok(payload)
    }
}
