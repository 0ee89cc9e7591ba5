//! Report framing
//!
//! Every outbound message travels as one fixed-size HID report. The payload is
//! wrapped between magic bytes together with the command opcode and a one-byte
//! additive checksum, then zero-padded to the report size.
//!
//! # Frame Format
//!
//! ```text
//! [0x5A][command: 2][payload: N][checksum: 1][0x5A][zero padding: 1019 - N]
//! ```
//!
//! The checksum is the low byte of the sum of the command and payload bytes.
//! Magic bytes and padding are not covered. There is no fragmentation: a
//! message that does not fit in one report is rejected before any I/O.

use crate::command::Command;
use crate::error::{ProtocolError, Result};
use bytes::Bytes;

/// Size of every report sent to the device
pub const REPORT_SIZE: usize = 1024;

/// Sentinel byte at frame start and directly after the checksum
pub const MAGIC_BYTE: u8 = 0x5A;

/// Bytes of framing around the command and payload (two magic, one checksum,
/// plus the two command bytes)
pub const FRAME_OVERHEAD: usize = 5;

/// Largest payload that still fits in a single report
pub const MAX_PAYLOAD_SIZE: usize = REPORT_SIZE - FRAME_OVERHEAD;

/// Compute the frame checksum over command ++ payload
///
/// # Example
/// ```
/// use protocol::{Command, checksum};
///
/// assert_eq!(checksum(Command::HANDSHAKE, b""), 0x35);
/// assert_eq!(checksum(Command([0xFF, 0x01]), b""), 0x00);
/// ```
pub fn checksum(command: Command, payload: &[u8]) -> u8 {
    command
        .as_bytes()
        .iter()
        .chain(payload)
        .fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Encode a command and payload into a single padded report
///
/// Returns exactly [`REPORT_SIZE`] bytes, or [`ProtocolError::FrameTooLarge`]
/// when the unpadded frame would exceed the report.
///
/// # Example
/// ```
/// use protocol::{Command, MAGIC_BYTE, REPORT_SIZE, encode_frame};
///
/// let frame = encode_frame(Command::HANDSHAKE, b"hello").unwrap();
/// assert_eq!(frame.len(), REPORT_SIZE);
/// assert_eq!(frame[0], MAGIC_BYTE);
/// assert_eq!(frame[9], MAGIC_BYTE);
/// ```
pub fn encode_frame(command: Command, payload: &[u8]) -> Result<Vec<u8>> {
    let size = FRAME_OVERHEAD + payload.len();
    if size > REPORT_SIZE {
        return Err(ProtocolError::FrameTooLarge {
            size,
            max: REPORT_SIZE,
        });
    }

    let mut frame = Vec::with_capacity(REPORT_SIZE);
    frame.push(MAGIC_BYTE);
    frame.extend_from_slice(command.as_bytes());
    frame.extend_from_slice(payload);
    frame.push(checksum(command, payload));
    frame.push(MAGIC_BYTE);
    frame.resize(REPORT_SIZE, 0);

    Ok(frame)
}

/// One outbound frame before serialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command opcode
    pub command: Command,
    /// Header block plus optional JSON body
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame
    pub fn new(command: Command, payload: impl Into<Bytes>) -> Self {
        Self {
            command,
            payload: payload.into(),
        }
    }

    /// Checksum byte that will be transmitted
    #[inline]
    pub fn checksum(&self) -> u8 {
        checksum(self.command, &self.payload)
    }

    /// Length of the frame before zero padding
    #[inline]
    pub fn unpadded_len(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    /// Serialize into a padded report
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_frame(self.command, &self.payload)
    }
}
