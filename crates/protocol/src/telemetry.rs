//! Telemetry snapshot schema
//!
//! The device firmware expects every section and field on every push, so the
//! shape here is fixed. Unavailable sources are represented by zero values
//! (or `-1` where the firmware uses that as "unknown"), never by omission.
//! All numbers are whole values; rounding happens before a snapshot is built.

use serde::{Deserialize, Serialize};

/// One polling tick of normalized host telemetry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub network: NetworkStats,
    pub memory: MemoryStats,
    pub cpu: CpuStats,
    pub gpu: GpuStats,
    pub disk: DiskStats,
    pub fans: Vec<FanStats>,
    pub motherboard: MotherboardStats,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

/// Network throughput (not monitored, always zero)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    pub upload: i64,
    pub download: i64,
}

/// Memory usage, sizes in MiB
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub total: i64,
    pub used: i64,
    /// Percent
    pub load: i64,
    pub temperature: i64,
    pub speed: i64,
}

/// CPU load, temperatures (Celsius) and clock (MHz)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuStats {
    pub load: i64,
    pub temperature: i64,
    pub temperature_package: i64,
    pub speed_average: i64,
    pub power: i64,
    pub voltage: i64,
    /// Percent
    pub usage: i64,
}

/// Discrete GPU statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuStats {
    pub has_dedicated: bool,
    /// Utilization percent
    pub load: i64,
    pub temperature: i64,
    /// Fan duty percent
    pub fan: i64,
    /// Graphics clock in MHz
    pub speed: i64,
    /// Watts (see the snapshot builder for the conversion used)
    pub power: i64,
    pub voltage: i64,
}

/// Voltage reported for GPUs; the firmware treats -1 as "not available"
pub const GPU_VOLTAGE_UNAVAILABLE: i64 = -1;

impl GpuStats {
    /// Placeholder emitted when no discrete GPU is present
    pub fn absent() -> Self {
        Self {
            has_dedicated: false,
            load: 0,
            temperature: 0,
            fan: 0,
            speed: 0,
            power: 0,
            voltage: GPU_VOLTAGE_UNAVAILABLE,
        }
    }
}

impl Default for GpuStats {
    fn default() -> Self {
        Self::absent()
    }
}

/// Disk statistics (not monitored, always zero)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskStats {
    pub total: i64,
    pub used: i64,
    pub load: i64,
    pub activity: i64,
    pub temperature: i64,
    pub read_speed: i64,
    pub write_speed: i64,
}

/// One fan entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FanStats {
    pub name: String,
    pub speed: i64,
}

/// Motherboard temperatures (not monitored, always zero)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotherboardStats {
    pub temperature: i64,
    pub chipset_temperature: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot_json_shape() {
        let json = serde_json::to_string(&TelemetrySnapshot::default()).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"network":{"upload":0,"download":0},"#,
                r#""memory":{"total":0,"used":0,"load":0,"temperature":0,"speed":0},"#,
                r#""cpu":{"load":0,"temperature":0,"temperaturePackage":0,"speedAverage":0,"power":0,"voltage":0,"usage":0},"#,
                r#""gpu":{"hasDedicated":false,"load":0,"temperature":0,"fan":0,"speed":0,"power":0,"voltage":-1},"#,
                r#""disk":{"total":0,"used":0,"load":0,"activity":0,"temperature":0,"readSpeed":0,"writeSpeed":0},"#,
                r#""fans":[],"#,
                r#""motherboard":{"temperature":0,"chipsetTemperature":0},"#,
                r#""timestamp":0}"#
            )
        );
    }

    #[test]
    fn test_absent_gpu() {
        let gpu = GpuStats::absent();
        assert!(!gpu.has_dedicated);
        assert_eq!(gpu.voltage, GPU_VOLTAGE_UNAVAILABLE);
        assert_eq!(GpuStats::default(), gpu);
    }
}
