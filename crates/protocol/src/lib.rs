//! Protocol library for ryuo-screen
//!
//! This crate defines the wire protocol spoken to the cooler's screen
//! controller: fixed-size report framing, command opcodes, the text header
//! block, and the JSON documents carried in configuration and telemetry pushes.
//! It performs no I/O.
//!
//! # Example
//!
//! ```
//! use protocol::{Command, Message, REPORT_SIZE, encode_frame};
//!
//! // Build the handshake payload for sequence 0
//! let payload = Message::Handshake.payload(0, 1_700_000_000_000).unwrap();
//!
//! // Wrap it in a single report
//! let frame = encode_frame(Command::HANDSHAKE, &payload).unwrap();
//! assert_eq!(frame.len(), REPORT_SIZE);
//! assert_eq!(&frame[..3], &[0x5A, 0x00, 0x35]);
//! ```

pub mod codec;
pub mod command;
pub mod display;
pub mod error;
pub mod header;
pub mod messages;
pub mod telemetry;

pub use codec::{
    FRAME_OVERHEAD, Frame, MAGIC_BYTE, MAX_PAYLOAD_SIZE, REPORT_SIZE, checksum, encode_frame,
};
pub use command::Command;
pub use display::{
    ConfigDocument, HostSpec, NO_GPU, ScreenFilter, ScreenProfile, ScreenSettings,
    WaterBlockScreen,
};
pub use error::{ProtocolError, Result};
pub use header::{MessageHeader, VERB_CONFIG, VERB_CONNECT, VERB_STATE};
pub use messages::Message;
pub use telemetry::{
    CpuStats, DiskStats, FanStats, GPU_VOLTAGE_UNAVAILABLE, GpuStats, MemoryStats,
    MotherboardStats, NetworkStats, TelemetrySnapshot,
};
