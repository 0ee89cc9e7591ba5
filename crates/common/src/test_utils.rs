//! Test utilities for ryuo-screen
//!
//! Provides in-memory implementations of the transport, clock and sensor seams
//! so sessions can be driven without hardware or real delays.
//!
//! # Example
//!
//! ```
//! use common::test_utils::{FixedClock, MemoryTransport, sample_config};
//! use common::{Session, SessionSettings};
//!
//! let mut session = Session::new(MemoryTransport::new(), FixedClock::new(0), SessionSettings::default());
//! session.connect().unwrap();
//! session.configure(sample_config()).unwrap();
//! assert_eq!(session.transport().written.len(), 2);
//! ```

use crate::sensors::{CpuReading, CpuSource, GpuReading, GpuSource, MemoryReading, MemorySource};
use crate::session::Clock;
use crate::transport::Transport;
use crate::{Error, Result};
use protocol::{ConfigDocument, HostSpec, ScreenProfile, ScreenSettings, WaterBlockScreen};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

/// Transport that records every written report
#[derive(Debug, Default)]
pub struct MemoryTransport {
    /// Reports in write order
    pub written: Vec<Vec<u8>>,
    /// Number of reads performed
    pub reads: usize,
    responses: VecDeque<Vec<u8>>,
    fail_writes_after: Option<usize>,
    read_error: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a report to be returned by the next read
    pub fn with_response(mut self, response: Vec<u8>) -> Self {
        self.responses.push_back(response);
        self
    }

    /// Accept `count` writes, then fail every write
    pub fn fail_writes_after(mut self, count: usize) -> Self {
        self.fail_writes_after = Some(count);
        self
    }

    /// Fail every read with a non-timeout error
    pub fn with_read_error(mut self) -> Self {
        self.read_error = true;
        self
    }
}

impl Transport for MemoryTransport {
    fn write_report(&mut self, report: &[u8]) -> Result<usize> {
        if let Some(limit) = self.fail_writes_after
            && self.written.len() >= limit
        {
            return Err(Error::TransportWrite("device disconnected".to_string()));
        }
        self.written.push(report.to_vec());
        Ok(report.len())
    }

    fn read_report(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<Option<usize>> {
        self.reads += 1;
        if self.read_error {
            return Err(Error::TransportRead("pipe error".to_string()));
        }
        Ok(self.responses.pop_front().map(|response| {
            let len = response.len().min(buf.len());
            buf[..len].copy_from_slice(&response[..len]);
            len
        }))
    }
}

/// Clock that only advances when slept on
#[derive(Debug)]
pub struct FixedClock {
    now: Cell<u64>,
    slept: RefCell<Vec<Duration>>,
}

impl FixedClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
            slept: RefCell::new(Vec::new()),
        }
    }

    /// Every sleep requested so far
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.borrow().clone()
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.now.set(self.now.get() + duration.as_millis() as u64);
        self.slept.borrow_mut().push(duration);
    }
}

/// CPU source returning a fixed reading
pub struct StaticCpu(pub CpuReading);

impl CpuSource for StaticCpu {
    fn read(&mut self) -> Result<CpuReading> {
        Ok(self.0)
    }
}

/// Memory source returning a fixed reading
pub struct StaticMemory(pub MemoryReading);

impl MemorySource for StaticMemory {
    fn read(&mut self) -> Result<MemoryReading> {
        Ok(self.0)
    }
}

/// GPU source returning a fixed reading
pub struct StaticGpu {
    name: String,
    reading: GpuReading,
}

impl StaticGpu {
    pub fn new(name: impl Into<String>, reading: GpuReading) -> Self {
        Self {
            name: name.into(),
            reading,
        }
    }
}

impl GpuSource for StaticGpu {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self) -> Result<GpuReading> {
        Ok(self.reading)
    }
}

/// Source that fails every read
pub struct FailingSource;

impl CpuSource for FailingSource {
    fn read(&mut self) -> Result<CpuReading> {
        Err(Error::Sensor("no cpu".to_string()))
    }
}

impl MemorySource for FailingSource {
    fn read(&mut self) -> Result<MemoryReading> {
        Err(Error::Sensor("no memory".to_string()))
    }
}

impl GpuSource for FailingSource {
    fn name(&self) -> &str {
        "failing"
    }

    fn read(&mut self) -> Result<GpuReading> {
        Err(Error::Sensor("no gpu".to_string()))
    }
}

/// Configuration document matching the stock device setup
pub fn sample_config() -> ConfigDocument {
    ConfigDocument {
        temperature: "Celsius".to_string(),
        water_block_screen: WaterBlockScreen {
            enable: true,
            display_in_sleep: true,
            brightness: 100,
            id: ScreenProfile {
                id: "Customization".to_string(),
                screen_mode: "Full Screen".to_string(),
                play_mode: "Single".to_string(),
                media: ScreenProfile::default_media(),
                settings: ScreenSettings::default(),
                sysinfo_display: vec!["CPU_USAGE".to_string(), "GPU_USAGE".to_string()],
                timezone: "Europe/Amsterdam".to_string(),
            },
        },
        spec: HostSpec::new("Test CPU", None),
    }
}

/// Header block of a written report (between the command and the blank line)
pub fn frame_header(frame: &[u8]) -> Option<&str> {
    let text = frame.get(3..)?;
    let end = text.windows(4).position(|w| w == b"\r\n\r\n")?;
    std::str::from_utf8(&text[..end]).ok()
}

/// `SeqNumber` declared in a written report
pub fn seq_number(frame: &[u8]) -> Option<u64> {
    frame_header(frame)?
        .lines()
        .find_map(|l| l.strip_prefix("SeqNumber="))
        .and_then(|v| v.parse().ok())
}

/// JSON body of a written report, as declared by `ContentLength`
pub fn frame_body(frame: &[u8]) -> Option<&[u8]> {
    let header = frame_header(frame)?;
    let len: usize = header
        .lines()
        .find_map(|l| l.strip_prefix("ContentLength="))?
        .parse()
        .ok()?;
    let start = 3 + header.len() + 4;
    frame.get(start..start + len)
}
