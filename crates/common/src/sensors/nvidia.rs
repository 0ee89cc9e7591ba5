//! NVIDIA GPU source backed by `nvidia-smi`

use super::{GpuReading, GpuSource};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

const READ_QUERY: &str = "utilization.gpu,temperature.gpu,fan.speed,clocks.gr,power.draw";
const DETECT_QUERY: &str = "name,driver_version";

/// Reads one GPU through `nvidia-smi` CSV queries
pub struct NvidiaSmiSource {
    program: PathBuf,
    index: u32,
    name: String,
}

impl NvidiaSmiSource {
    /// Source for GPU `index` with a known name
    pub fn new(program: impl Into<PathBuf>, index: u32, name: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            index,
            name: name.into(),
        }
    }

    fn query(&self, fields: &str) -> Result<String> {
        run_query(&self.program, self.index, fields)
    }
}

impl GpuSource for NvidiaSmiSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&mut self) -> Result<GpuReading> {
        let output = self.query(READ_QUERY)?;
        let line = output
            .lines()
            .next()
            .ok_or_else(|| Error::Sensor("nvidia-smi returned no rows".to_string()))?;
        parse_reading(line)
    }
}

/// Look for the first NVIDIA GPU
///
/// Returns `None` when the tool is missing or reports no devices. Absence of a
/// GPU is not an error.
pub fn detect_nvidia_gpu(program: impl Into<PathBuf>) -> Option<NvidiaSmiSource> {
    let program = program.into();
    let output = match run_query(&program, 0, DETECT_QUERY) {
        Ok(output) => output,
        // The tool ran, so the driver is installed
        Err(Error::Sensor(reason)) => {
            info!("NVIDIA driver detected but no GPU was found: {}", reason);
            return None;
        }
        Err(e) => {
            debug!("NVIDIA GPU not available: {}", e);
            return None;
        }
    };

    let Some(line) = output.lines().next().filter(|l| !l.trim().is_empty()) else {
        info!("NVIDIA driver detected but no GPU was listed");
        return None;
    };

    let mut fields = line.split(',').map(str::trim);
    let name = fields.next().unwrap_or_default().to_string();
    if let Some(driver) = fields.next() {
        info!("NVIDIA driver version: {}", driver);
    }
    info!("NVIDIA GPU detected: {}", name);

    Some(NvidiaSmiSource::new(program, 0, name))
}

fn run_query(program: &Path, index: u32, fields: &str) -> Result<String> {
    let output = Command::new(program)
        .arg(format!("--id={}", index))
        .arg(format!("--query-gpu={}", fields))
        .arg("--format=csv,noheader,nounits")
        .output()?;

    if !output.status.success() {
        // nvidia-smi reports most failures on stdout
        let message = if output.stderr.is_empty() {
            &output.stdout
        } else {
            &output.stderr
        };
        return Err(Error::Sensor(format!(
            "nvidia-smi exited with {}: {}",
            output.status,
            String::from_utf8_lossy(message).trim()
        )));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| Error::Sensor(format!("nvidia-smi output is not UTF-8: {}", e)))
}

/// Parse one `utilization, temperature, fan, clock, power` CSV row
///
/// Fields the board does not support (`[N/A]`, `[Not Supported]`) read as zero.
/// Power is reported in watts and converted to milliwatts.
fn parse_reading(line: &str) -> Result<GpuReading> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 5 {
        return Err(Error::Sensor(format!(
            "Expected 5 fields from nvidia-smi, got {}: {:?}",
            fields.len(),
            line
        )));
    }

    let value = |raw: &str| -> Result<f64> {
        if raw.starts_with('[') {
            return Ok(0.0);
        }
        raw.parse()
            .map_err(|_| Error::Sensor(format!("Invalid nvidia-smi value: {:?}", raw)))
    };

    Ok(GpuReading {
        utilization: value(fields[0])?,
        temperature: value(fields[1])?,
        fan: value(fields[2])?,
        clock_mhz: value(fields[3])?,
        power_mw: value(fields[4])? * 1000.0,
    })
}
