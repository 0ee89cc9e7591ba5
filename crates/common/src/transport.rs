//! Device transport seam
//!
//! The session is the only writer and reader of the device. Implementations
//! must block on writes and honour the read timeout without retrying.

use crate::Result;
use std::time::Duration;

/// Blocking report-oriented device channel
pub trait Transport {
    /// Write one full report, returning the number of bytes accepted
    fn write_report(&mut self, report: &[u8]) -> Result<usize>;

    /// Read one report into `buf`
    ///
    /// Returns `Ok(None)` when nothing arrived within `timeout`. A timeout is
    /// not a failure.
    fn read_report(&mut self, buf: &mut [u8], timeout: Duration) -> Result<Option<usize>>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_report(&mut self, report: &[u8]) -> Result<usize> {
        (**self).write_report(report)
    }

    fn read_report(&mut self, buf: &mut [u8], timeout: Duration) -> Result<Option<usize>> {
        (**self).read_report(buf, timeout)
    }
}
