//! Common error types

use crate::session::SessionState;
use protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Frame encoding failed (including payloads that do not fit in one report)
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Device not found or could not be claimed
    #[error("Failed to open device {vendor_id:04x}:{product_id:04x}: {reason}")]
    TransportOpen {
        vendor_id: u16,
        product_id: u16,
        reason: String,
    },

    /// Report could not be written; the session has no recovery path
    #[error("Failed to write report: {0}")]
    TransportWrite(String),

    /// Read failed for a reason other than a timeout
    #[error("Failed to read report: {0}")]
    TransportRead(String),

    /// Operation called out of order
    #[error("Invalid session state: expected {expected:?}, found {actual:?}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },

    #[error("Sensor error: {0}")]
    Sensor(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error came from encoding rather than the device
    ///
    /// Encoding failures happen before any I/O, so nothing was written.
    pub fn is_encoding(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
