//! Device session state machine
//!
//! Drives the exchange with the screen controller:
//!
//! ```text
//! Disconnected --connect--> AwaitingHandshakeAck --configure--> AwaitingConfigAck
//!     --start_streaming--> Streaming --tick--> Streaming ...
//! ```
//!
//! The machine only moves forward. A single sequence counter covers every
//! message kind and is advanced only after a report was written. After each
//! write the session performs one bounded read for pacing; its content is
//! never interpreted and a timeout is not an error.

use crate::snapshot::SensorHub;
use crate::transport::Transport;
use crate::{Error, Result};
use protocol::{Command, ConfigDocument, Frame, Message, REPORT_SIZE, TelemetrySnapshot};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, trace, warn};

/// Time source and delay provider
pub trait Clock {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;

    /// Block for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall clock with real sleeps
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Protocol phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    AwaitingHandshakeAck,
    AwaitingConfigAck,
    Streaming,
}

/// Timing and opcode settings
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Delay between the handshake and the configuration push
    pub settle_delay: Duration,
    /// Timeout of the read following every write
    pub read_timeout: Duration,
    /// Opcode used for telemetry pushes
    pub telemetry_command: Command,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(1),
            read_timeout: Duration::from_secs(5),
            telemetry_command: Command::TELEMETRY,
        }
    }
}

/// Exclusive owner of the device transport and the sequence counter
pub struct Session<T: Transport, C: Clock = SystemClock> {
    transport: T,
    clock: C,
    settings: SessionSettings,
    seq: u64,
    state: SessionState,
}

impl<T: Transport, C: Clock> Session<T, C> {
    pub fn new(transport: T, clock: C, settings: SessionSettings) -> Self {
        Self {
            transport,
            clock,
            settings,
            seq: 0,
            state: SessionState::Disconnected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Sequence number the next message will carry
    pub fn sequence(&self) -> u64 {
        self.seq
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Send the handshake
    pub fn connect(&mut self) -> Result<()> {
        self.expect_state(SessionState::Disconnected)?;

        let now = self.clock.now_millis();
        self.send(Command::HANDSHAKE, &Message::Handshake, now)?;
        self.state = SessionState::AwaitingHandshakeAck;
        info!("Handshake sent");
        Ok(())
    }

    /// Wait for the device to settle, then push the display configuration
    pub fn configure(&mut self, document: ConfigDocument) -> Result<()> {
        self.expect_state(SessionState::AwaitingHandshakeAck)?;

        self.clock.sleep(self.settings.settle_delay);
        let now = self.clock.now_millis();
        self.send(Command::CONFIG, &Message::Config(document), now)?;
        self.state = SessionState::AwaitingConfigAck;
        info!("Config sent");
        Ok(())
    }

    /// Enter the streaming state; the device sends no acknowledgement
    pub fn start_streaming(&mut self) -> Result<()> {
        self.expect_state(SessionState::AwaitingConfigAck)?;
        self.state = SessionState::Streaming;
        info!("Streaming telemetry");
        Ok(())
    }

    /// Sample the sensors and push one snapshot
    pub fn tick(&mut self, sensors: &mut SensorHub) -> Result<TelemetrySnapshot> {
        self.expect_state(SessionState::Streaming)?;

        let now = self.clock.now_millis();
        let snapshot = sensors.sample(now);
        let command = self.settings.telemetry_command;
        self.send(command, &Message::Telemetry(snapshot.clone()), now)?;
        debug!("Telemetry sent");
        Ok(snapshot)
    }

    fn expect_state(&self, expected: SessionState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    /// The single write path
    ///
    /// Encoding completes before the transport is touched, so an oversized
    /// message performs no I/O and leaves the sequence unchanged.
    fn send(&mut self, command: Command, message: &Message, date_ms: u64) -> Result<()> {
        let frame = Frame::new(command, message.payload(self.seq, date_ms)?);
        let report = frame.encode()?;

        let written = self.transport.write_report(&report)?;
        if written != REPORT_SIZE {
            return Err(Error::TransportWrite(format!(
                "Short write: {} of {} bytes",
                written, REPORT_SIZE
            )));
        }
        trace!(
            "Wrote {} ({} bytes before padding, checksum {:02x}) seq={}",
            command,
            frame.unpadded_len(),
            frame.checksum(),
            self.seq
        );
        self.seq += 1;

        self.await_response(message.verb());
        Ok(())
    }

    /// Read one report for pacing and discard it
    fn await_response(&mut self, label: &str) {
        let mut buf = [0u8; REPORT_SIZE];
        match self.transport.read_report(&mut buf, self.settings.read_timeout) {
            Ok(Some(len)) => trace!("{} response: {}", label, hex::encode(&buf[..len])),
            Ok(None) => debug!("{} no response", label),
            Err(e) => warn!("{} response read failed: {}", label, e),
        }
    }
}
