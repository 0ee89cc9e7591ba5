//! Text header block
//!
//! Each payload starts with ASCII `Key=Value` lines terminated by CRLF and a
//! blank line. When a JSON body follows, the header declares its type and
//! exact byte length.
//!
//! ```text
//! POST config 1\r\n
//! SeqNumber=1\r\n
//! Date=1700000000000\r\n
//! ContentType=json\r\n
//! ContentLength=123\r\n
//! \r\n
//! ```

use std::fmt::Write;

/// Verb line for the handshake
pub const VERB_CONNECT: &str = "POST conn 1";

/// Verb line for the configuration push
pub const VERB_CONFIG: &str = "POST config 1";

/// Verb line for the telemetry push
pub const VERB_STATE: &str = "STATE all 1";

/// Header block preceding every payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    /// First line, e.g. `POST conn 1`
    pub verb: &'static str,
    /// Session-wide sequence number
    pub seq: u64,
    /// Milliseconds since the Unix epoch
    pub date_ms: u64,
    /// Byte length of the JSON body, if one follows
    pub content_length: Option<usize>,
}

impl MessageHeader {
    /// Render the header including the terminating blank line
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(96);
        // Writing into a String cannot fail
        let _ = write!(
            out,
            "{}\r\nSeqNumber={}\r\nDate={}\r\n",
            self.verb, self.seq, self.date_ms
        );
        if let Some(len) = self.content_length {
            let _ = write!(out, "ContentType=json\r\nContentLength={}\r\n", len);
        }
        out.push_str("\r\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_without_body() {
        let header = MessageHeader {
            verb: VERB_CONNECT,
            seq: 0,
            date_ms: 1_700_000_000_000,
            content_length: None,
        };
        assert_eq!(
            header.render(),
            "POST conn 1\r\nSeqNumber=0\r\nDate=1700000000000\r\n\r\n"
        );
    }

    #[test]
    fn test_render_with_body() {
        let header = MessageHeader {
            verb: VERB_STATE,
            seq: 42,
            date_ms: 5,
            content_length: Some(310),
        };
        assert_eq!(
            header.render(),
            "STATE all 1\r\nSeqNumber=42\r\nDate=5\r\nContentType=json\r\nContentLength=310\r\n\r\n"
        );
    }
}
