//! Telemetry snapshot builder
//!
//! Turns raw sensor readings into the fixed wire schema. Every field is always
//! populated: missing sensors become zeros, a missing GPU becomes the
//! "no dedicated GPU" placeholder, and unmonitored sections (network, disk,
//! fans, motherboard) keep their zero defaults.
//!
//! Rounding is half away from zero (`f64::round`) for every value.

use crate::sensors::{CpuReading, CpuSource, GpuReading, GpuSource, MemoryReading, MemorySource};
use protocol::{
    CpuStats, DiskStats, GPU_VOLTAGE_UNAVAILABLE, GpuStats, MemoryStats, MotherboardStats,
    NetworkStats, TelemetrySnapshot,
};
use tracing::warn;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Divisor the device firmware expects for GPU power
///
/// Not an SI conversion: milliwatts are divided by 1024, not 1000. The screen
/// was calibrated against this value, so it must stay.
pub const GPU_POWER_DIVISOR: f64 = 1024.0;

#[inline]
fn round(value: f64) -> i64 {
    value.round() as i64
}

/// Build a snapshot from one set of readings
pub fn build_snapshot(
    cpu: &CpuReading,
    memory: &MemoryReading,
    gpu: Option<&GpuReading>,
    timestamp_ms: u64,
) -> TelemetrySnapshot {
    TelemetrySnapshot {
        network: NetworkStats::default(),
        memory: MemoryStats {
            total: round(memory.total_bytes as f64 / BYTES_PER_MIB),
            used: round(memory.used_bytes as f64 / BYTES_PER_MIB),
            load: round(memory.load),
            temperature: 0,
            speed: 0,
        },
        cpu: CpuStats {
            load: round(cpu.load),
            temperature: round(cpu.core_temp.unwrap_or(0.0)),
            temperature_package: round(cpu.package_temp.unwrap_or(0.0)),
            speed_average: round(cpu.clock_mhz),
            power: 0,
            voltage: 0,
            usage: round(cpu.usage),
        },
        gpu: gpu.map(gpu_stats).unwrap_or_else(GpuStats::absent),
        disk: DiskStats::default(),
        fans: Vec::new(),
        motherboard: MotherboardStats::default(),
        timestamp: timestamp_ms,
    }
}

fn gpu_stats(gpu: &GpuReading) -> GpuStats {
    GpuStats {
        has_dedicated: true,
        load: round(gpu.utilization),
        temperature: round(gpu.temperature),
        fan: round(gpu.fan),
        speed: round(gpu.clock_mhz),
        power: round(gpu.power_mw / GPU_POWER_DIVISOR),
        voltage: GPU_VOLTAGE_UNAVAILABLE,
    }
}

/// Owns the sensor sources and samples them once per tick
pub struct SensorHub {
    cpu: Box<dyn CpuSource>,
    memory: Box<dyn MemorySource>,
    gpu: Option<Box<dyn GpuSource>>,
}

impl SensorHub {
    pub fn new(
        cpu: Box<dyn CpuSource>,
        memory: Box<dyn MemorySource>,
        gpu: Option<Box<dyn GpuSource>>,
    ) -> Self {
        Self { cpu, memory, gpu }
    }

    /// Name of the discrete GPU, if one is attached
    pub fn gpu_name(&self) -> Option<&str> {
        self.gpu.as_ref().map(|g| g.name())
    }

    /// Read every source and build a snapshot
    ///
    /// Source failures are logged and replaced by defaults; sampling never fails.
    pub fn sample(&mut self, timestamp_ms: u64) -> TelemetrySnapshot {
        let cpu = self.cpu.read().unwrap_or_else(|e| {
            warn!("CPU sensors unavailable: {}", e);
            CpuReading::default()
        });

        let memory = self.memory.read().unwrap_or_else(|e| {
            warn!("Memory sensors unavailable: {}", e);
            MemoryReading::default()
        });

        let gpu = self.gpu.as_mut().and_then(|gpu| match gpu.read() {
            Ok(reading) => Some(reading),
            Err(e) => {
                warn!("GPU sensors unavailable this tick: {}", e);
                None
            }
        });

        build_snapshot(&cpu, &memory, gpu.as_ref(), timestamp_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FailingSource, StaticCpu, StaticGpu, StaticMemory};

    fn cpu() -> CpuReading {
        CpuReading {
            load: 12.4,
            usage: 33.5,
            clock_mhz: 4712.6,
            core_temp: Some(58.49),
            package_temp: Some(65.5),
        }
    }

    fn memory() -> MemoryReading {
        MemoryReading {
            total_bytes: 32 * 1024 * 1024 * 1024,
            used_bytes: 8 * 1024 * 1024 * 1024 + 600 * 1024,
            load: 25.3,
        }
    }

    fn gpu() -> GpuReading {
        GpuReading {
            utilization: 97.0,
            temperature: 71.0,
            fan: 55.0,
            clock_mhz: 2745.0,
            power_mw: 250_000.0,
        }
    }

    #[test]
    fn test_cpu_section() {
        let snapshot = build_snapshot(&cpu(), &memory(), None, 1);
        assert_eq!(
            snapshot.cpu,
            CpuStats {
                load: 12,
                temperature: 58,
                temperature_package: 66,
                speed_average: 4713,
                power: 0,
                voltage: 0,
                usage: 34,
            }
        );
    }

    #[test]
    fn test_missing_cpu_temperatures_default_to_zero() {
        let reading = CpuReading {
            core_temp: None,
            package_temp: None,
            ..cpu()
        };
        let snapshot = build_snapshot(&reading, &memory(), None, 1);
        assert_eq!(snapshot.cpu.temperature, 0);
        assert_eq!(snapshot.cpu.temperature_package, 0);
    }

    #[test]
    fn test_memory_in_mebibytes() {
        let snapshot = build_snapshot(&cpu(), &memory(), None, 1);
        assert_eq!(snapshot.memory.total, 32 * 1024);
        // 600 KiB rounds up to one extra MiB
        assert_eq!(snapshot.memory.used, 8 * 1024 + 1);
        assert_eq!(snapshot.memory.load, 25);
        assert_eq!(snapshot.memory.temperature, 0);
        assert_eq!(snapshot.memory.speed, 0);
    }

    #[test]
    fn test_gpu_present() {
        let snapshot = build_snapshot(&cpu(), &memory(), Some(&gpu()), 1);
        assert!(snapshot.gpu.has_dedicated);
        assert_eq!(snapshot.gpu.load, 97);
        assert_eq!(snapshot.gpu.temperature, 71);
        assert_eq!(snapshot.gpu.fan, 55);
        assert_eq!(snapshot.gpu.speed, 2745);
        // 250000 / 1024 = 244.14
        assert_eq!(snapshot.gpu.power, 244);
        assert_eq!(snapshot.gpu.voltage, -1);
    }

    #[test]
    fn test_gpu_absent_keeps_section() {
        let snapshot = build_snapshot(&cpu(), &memory(), None, 1);
        assert_eq!(snapshot.gpu, GpuStats::absent());
    }

    #[test]
    fn test_unmonitored_sections_are_zero() {
        let snapshot = build_snapshot(&cpu(), &memory(), Some(&gpu()), 1_700_000_000_000);
        assert_eq!(snapshot.network, NetworkStats::default());
        assert_eq!(snapshot.disk, DiskStats::default());
        assert!(snapshot.fans.is_empty());
        assert_eq!(snapshot.motherboard, MotherboardStats::default());
        assert_eq!(snapshot.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_hub_degrades_failed_sources() {
        let mut hub = SensorHub::new(
            Box::new(FailingSource),
            Box::new(FailingSource),
            Some(Box::new(FailingSource)),
        );
        let snapshot = hub.sample(42);
        assert_eq!(snapshot.cpu, CpuStats::default());
        assert_eq!(snapshot.memory, MemoryStats::default());
        assert!(!snapshot.gpu.has_dedicated);
        assert_eq!(snapshot.timestamp, 42);
    }

    #[test]
    fn test_hub_reads_sources() {
        let mut hub = SensorHub::new(
            Box::new(StaticCpu(cpu())),
            Box::new(StaticMemory(memory())),
            Some(Box::new(StaticGpu::new("RTX", gpu()))),
        );
        assert_eq!(hub.gpu_name(), Some("RTX"));
        let snapshot = hub.sample(7);
        assert_eq!(snapshot, build_snapshot(&cpu(), &memory(), Some(&gpu()), 7));
    }
}
