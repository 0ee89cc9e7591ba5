//! Protocol error types

use thiserror::Error;

/// Protocol-level errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// JSON body could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Encoded frame does not fit in a single report
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// Command opcode could not be parsed
    #[error("Invalid command opcode: {0}")]
    InvalidCommand(String),
}

/// Type alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_too_large_error() {
        let err = ProtocolError::FrameTooLarge {
            size: 1025,
            max: 1024,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Frame too large"));
        assert!(msg.contains("1025"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn test_invalid_command_error() {
        let err = ProtocolError::InvalidCommand("0xZZ".to_string());
        assert_eq!(format!("{}", err), "Invalid command opcode: 0xZZ");
    }
}
