//! Host sensor sources
//!
//! Each source returns raw, unrounded readings. Normalization into the wire
//! schema happens in [`crate::snapshot`]. Sources may keep state between reads
//! (CPU usage is a delta between two refreshes).

pub mod host;
pub mod nvidia;

use crate::Result;

pub use host::{HostCpuSource, HostMemorySource, cpu_model_name};
pub use nvidia::{NvidiaSmiSource, detect_nvidia_gpu};

/// Raw CPU statistics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuReading {
    /// Load percentage (load average relative to logical CPU count)
    pub load: f64,
    /// Busy time percentage since the previous read
    pub usage: f64,
    /// Mean clock across cores
    pub clock_mhz: f64,
    /// Core temperature in Celsius, when a recognized sensor group exists
    pub core_temp: Option<f64>,
    /// Package temperature in Celsius, when a recognized sensor group exists
    pub package_temp: Option<f64>,
}

/// Raw memory statistics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryReading {
    pub total_bytes: u64,
    pub used_bytes: u64,
    /// Used percentage
    pub load: f64,
}

/// Raw discrete GPU statistics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GpuReading {
    /// Utilization percentage
    pub utilization: f64,
    /// Celsius
    pub temperature: f64,
    /// Fan duty percentage
    pub fan: f64,
    /// Graphics clock
    pub clock_mhz: f64,
    /// Board power draw in milliwatts
    pub power_mw: f64,
}

/// Provider of CPU statistics
pub trait CpuSource: Send {
    fn read(&mut self) -> Result<CpuReading>;
}

/// Provider of memory statistics
pub trait MemorySource: Send {
    fn read(&mut self) -> Result<MemoryReading>;
}

/// Provider of discrete GPU statistics
///
/// Only constructed when a supported driver is present.
pub trait GpuSource: Send {
    /// Marketing name, sent once in the configuration push
    fn name(&self) -> &str;

    fn read(&mut self) -> Result<GpuReading>;
}
