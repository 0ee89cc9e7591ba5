//! ryuo-screen daemon
//!
//! Drives the LCD on an ASUS ROG Ryuo IV water block: pushes the display
//! configuration once, then streams host telemetry every tick.

mod config;
mod service;
mod usb;
mod worker;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use common::sensors::{
    GpuSource, HostCpuSource, HostMemorySource, cpu_model_name, detect_nvidia_gpu,
};
use common::{SensorHub, Session, SystemClock, setup_logging};
use config::DaemonConfig;
use protocol::HostSpec;
use tokio::signal;
use tracing::{debug, error, info, warn};
use usb::HidDevice;
use worker::{DisplayWorker, WorkerBridge, WorkerEvent, create_worker_bridge, spawn_display_worker};

#[derive(Parser, Debug)]
#[command(name = "ryuo-screen")]
#[command(
    author,
    version,
    about = "Drive the LCD of an ASUS ROG Ryuo IV cooler with host telemetry"
)]
#[command(long_about = "
Streams CPU, memory and GPU telemetry to the screen on an ASUS ROG Ryuo IV
water block over USB HID.

EXAMPLES:
    # Run with default config
    ryuo-screen

    # Run with custom config
    ryuo-screen --config /path/to/daemon.toml

    # List USB devices and exit
    ryuo-screen --list-devices

    # Send five telemetry updates and exit
    ryuo-screen --ticks 5 --log-level debug

CONFIGURATION:
    The daemon looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/ryuo-screen/daemon.toml
    3. /etc/ryuo-screen/daemon.toml
    4. Built-in defaults
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// List USB devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Stop after this many telemetry updates
    #[arg(long, value_name = "N")]
    ticks: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --save-config flag early (before loading config)
    if args.save_config {
        let config = DaemonConfig::default();
        let path = DaemonConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    // Load configuration first (to get log level from config if not specified).
    // Defaults apply only when no file exists; a broken file is fatal.
    let config_path = DaemonConfig::locate(args.config.clone());
    let config = match &config_path {
        Some(path) => DaemonConfig::load(path).context("Failed to load configuration")?,
        None => DaemonConfig::default(),
    };

    // Use CLI log level if specified, otherwise use config value
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.daemon.log_level);

    setup_logging(log_level).context("Failed to setup logging")?;

    info!("ryuo-screen v{}", env!("CARGO_PKG_VERSION"));
    info!("Log level: {}", log_level);
    match &config_path {
        Some(path) => info!("Loaded configuration from: {}", path.display()),
        None => info!("No configuration file found, using defaults"),
    }

    if args.list_devices {
        return list_devices_mode(&config);
    }

    let sensors = build_sensor_hub(&config);
    let cpu_name = config
        .host
        .cpu_name
        .clone()
        .or_else(cpu_model_name)
        .unwrap_or_else(|| "Unknown CPU".to_string());
    let spec = HostSpec::new(cpu_name, sensors.gpu_name().map(str::to_string));
    info!("Host: {} / {}", spec.cpu, spec.gpu);
    let document = config.display.to_document(spec);

    let vendor_id = config.device.vendor_id()?;
    let product_id = config.device.product_id()?;
    let device = HidDevice::open(vendor_id, product_id, config.device.write_timeout())
        .context("Failed to open screen controller")?;

    let tick_interval = config.session.tick_interval();
    if let Some(timeout) = service::watchdog_timeout()
        && tick_interval * 2 > timeout
    {
        warn!(
            "Tick interval {:?} exceeds half the systemd watchdog timeout {:?}",
            tick_interval, timeout
        );
    }

    let session = Session::new(device, SystemClock, config.session_settings());
    let worker = DisplayWorker::new(session, sensors, document, tick_interval, args.ticks);

    let (bridge, channels) = create_worker_bridge();
    let worker_handle =
        spawn_display_worker(worker, channels).context("Failed to spawn display worker")?;

    let result = run_until_stopped(&bridge).await;
    bridge.shutdown();

    service::notify_stopping().context("Failed to notify systemd stopping")?;

    // Wait for the worker thread to release the device
    if let Err(e) = worker_handle.join() {
        error!("Display worker thread panicked: {:?}", e);
    }

    info!("Shutdown complete");
    result
}

/// Sensor sources for this host
fn build_sensor_hub(config: &DaemonConfig) -> SensorHub {
    let host = &config.host;
    let cpu = HostCpuSource::new();
    let memory = HostMemorySource::new();

    let gpu = if host.detect_gpu {
        detect_nvidia_gpu(host.nvidia_smi()).map(|gpu| Box::new(gpu) as Box<dyn GpuSource>)
    } else {
        None
    };

    match &gpu {
        Some(gpu) => info!("Dedicated GPU: {}", gpu.name()),
        None => info!("No dedicated GPU detected"),
    }

    SensorHub::new(Box::new(cpu), Box::new(memory), gpu)
}

/// Relay worker events to systemd until the worker stops
async fn run_until_stopped(bridge: &WorkerBridge) -> Result<()> {
    if service::is_systemd() {
        info!("Running under systemd");
    }
    info!("Press Ctrl+C to shutdown");

    let mut stopping = false;
    loop {
        tokio::select! {
            result = signal::ctrl_c(), if !stopping => {
                match result {
                    Ok(()) => info!("Received Ctrl+C, shutting down gracefully..."),
                    Err(e) => error!("Error waiting for Ctrl+C: {}", e),
                }
                stopping = true;
                bridge.shutdown();
            }
            event = bridge.recv_event() => match event {
                Some(WorkerEvent::Streaming) => {
                    service::notify_ready().context("Failed to notify systemd ready")?;
                    service::notify_status("Streaming telemetry")
                        .context("Failed to send status to systemd")?;
                }
                Some(WorkerEvent::Tick { sequence }) => {
                    debug!("Telemetry delivered, next seq {}", sequence);
                    if let Err(e) = service::notify_watchdog() {
                        error!("Failed to send watchdog keepalive: {:#}", e);
                    }
                }
                Some(WorkerEvent::Stopped(result)) => {
                    let ticks = result.context("Display session failed")?;
                    info!("Sent {} telemetry updates", ticks);
                    return Ok(());
                }
                None => return Err(anyhow!("Display worker exited without reporting")),
            },
        }
    }
}

/// List USB devices and exit
fn list_devices_mode(config: &DaemonConfig) -> Result<()> {
    let target = (config.device.vendor_id()?, config.device.product_id()?);
    let devices = usb::list_devices().context("Failed to enumerate USB devices")?;

    if devices.is_empty() {
        println!("No USB devices found.");
        return Ok(());
    }

    println!("Found {} USB device(s):\n", devices.len());
    for device in devices {
        let marker = if (device.vendor_id, device.product_id) == target {
            " (screen controller)"
        } else {
            ""
        };
        println!(
            "  Bus {:03} Device {:03} {:04x}:{:04x} - {} {}{}",
            device.bus_number,
            device.device_address,
            device.vendor_id,
            device.product_id,
            device
                .manufacturer
                .as_deref()
                .unwrap_or("Unknown Manufacturer"),
            device.product.as_deref().unwrap_or("Unknown Product"),
            marker
        );
    }

    Ok(())
}
