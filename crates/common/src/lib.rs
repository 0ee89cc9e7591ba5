//! Common utilities for ryuo-screen
//!
//! This crate provides everything between the wire protocol and the device:
//! the session state machine, the transport seam it writes through, the host
//! sensor sources, the telemetry snapshot builder, error handling and logging.

pub mod error;
pub mod logging;
pub mod sensors;
pub mod session;
pub mod snapshot;
pub mod test_utils;
pub mod transport;

pub use error::{Error, Result};
pub use logging::setup_logging;
pub use session::{Clock, Session, SessionSettings, SessionState, SystemClock};
pub use snapshot::{GPU_POWER_DIVISOR, SensorHub, build_snapshot};
pub use transport::Transport;
