//! CPU and memory sources backed by sysinfo

use super::{CpuReading, CpuSource, MemoryReading, MemorySource};
use crate::{Error, Result};
use sysinfo::{Components, System};
use tracing::{debug, trace};

/// Sensor drivers we know how to read CPU temperatures from
const CPU_SENSOR_DRIVERS: &[&str] = &["k10temp", "coretemp"];

/// Labels marking the package (or control) sensor of a driver
const PACKAGE_LABELS: &[&str] = &["Tctl", "Tdie", "Package"];

/// CPU statistics for the running host
///
/// Usage is the delta between two refreshes, so the constructor takes the
/// first sample and every read takes the next one.
pub struct HostCpuSource {
    system: System,
    components: Components,
}

impl HostCpuSource {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();

        let components = Components::new_with_refreshed_list();
        debug!("Found {} temperature sensors", components.list().len());

        Self { system, components }
    }
}

impl Default for HostCpuSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuSource for HostCpuSource {
    fn read(&mut self) -> Result<CpuReading> {
        self.system.refresh_cpu_all();
        let cpus = self.system.cpus();
        if cpus.is_empty() {
            return Err(Error::Sensor("No CPUs reported".to_string()));
        }

        let frequencies: Vec<u64> = cpus.iter().map(|cpu| cpu.frequency()).collect();
        let load = normalized_load(System::load_average().one, cpus.len());

        self.components.refresh(false);
        let (package_temp, core_temp) = match cpu_temperatures(
            self.components
                .list()
                .iter()
                .filter_map(|c| c.temperature().map(|t| (c.label(), t))),
        ) {
            Some((package, core)) => (Some(package), Some(core)),
            None => (None, None),
        };

        let reading = CpuReading {
            load,
            usage: self.system.global_cpu_usage() as f64,
            clock_mhz: mean_frequency(&frequencies),
            core_temp,
            package_temp,
        };
        trace!("CPU reading: {:?}", reading);
        Ok(reading)
    }
}

/// Memory statistics for the running host
pub struct HostMemorySource {
    system: System,
}

impl HostMemorySource {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for HostMemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource for HostMemorySource {
    fn read(&mut self) -> Result<MemoryReading> {
        self.system.refresh_memory();
        memory_reading(self.system.total_memory(), self.system.used_memory())
    }
}

/// Brand string of the first CPU
pub fn cpu_model_name() -> Option<String> {
    let mut system = System::new();
    system.refresh_cpu_all();
    system
        .cpus()
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .filter(|name| !name.is_empty())
}

/// One-minute load average as a percentage of the logical CPU count
fn normalized_load(one_minute: f64, cpus: usize) -> f64 {
    one_minute / cpus.max(1) as f64 * 100.0
}

fn mean_frequency(frequencies: &[u64]) -> f64 {
    if frequencies.is_empty() {
        return 0.0;
    }
    frequencies.iter().sum::<u64>() as f64 / frequencies.len() as f64
}

fn memory_reading(total_bytes: u64, used_bytes: u64) -> Result<MemoryReading> {
    if total_bytes == 0 {
        return Err(Error::Sensor("Total memory unavailable".to_string()));
    }
    Ok(MemoryReading {
        total_bytes,
        used_bytes,
        load: used_bytes as f64 / total_bytes as f64 * 100.0,
    })
}

/// Package and core temperatures from labelled sensor values
///
/// Only sensors of a recognized CPU driver are considered. The package is
/// the control/package sensor when one is labelled, otherwise the first
/// match; the core is the next sensor of that driver, falling back to the
/// package.
fn cpu_temperatures<'a>(sensors: impl IntoIterator<Item = (&'a str, f32)>) -> Option<(f64, f64)> {
    let cpu: Vec<(&str, f64)> = sensors
        .into_iter()
        .filter(|(label, _)| CPU_SENSOR_DRIVERS.iter().any(|d| label.starts_with(d)))
        .map(|(label, t)| (label, t as f64))
        .collect();

    let package_index = cpu
        .iter()
        .position(|(label, _)| PACKAGE_LABELS.iter().any(|p| label.contains(p)))
        .unwrap_or(0);
    let package = cpu.get(package_index)?.1;

    let core = cpu
        .iter()
        .enumerate()
        .find(|(i, _)| *i != package_index)
        .map_or(package, |(_, (_, t))| *t);

    Some((package, core))
}
