//! Daemon configuration management

use anyhow::{Context, Result, anyhow};
use common::SessionSettings;
use protocol::{
    Command, ConfigDocument, HostSpec, ScreenFilter, ScreenProfile, ScreenSettings,
    WaterBlockScreen,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub daemon: DaemonSettings,
    #[serde(default)]
    pub device: DeviceSettings,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub host: HostSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonSettings {
    pub log_level: String,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Which USB device to drive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Vendor ID in `0x` hex form
    #[serde(default = "DeviceSettings::default_vendor_id")]
    pub vendor_id: String,
    /// Product ID in `0x` hex form
    #[serde(default = "DeviceSettings::default_product_id")]
    pub product_id: String,
    /// Timeout for a single report write
    #[serde(default = "DeviceSettings::default_write_timeout")]
    pub write_timeout_ms: u64,
    /// Timeout for the read following every write
    #[serde(default = "DeviceSettings::default_read_timeout")]
    pub read_timeout_ms: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            vendor_id: Self::default_vendor_id(),
            product_id: Self::default_product_id(),
            write_timeout_ms: Self::default_write_timeout(),
            read_timeout_ms: Self::default_read_timeout(),
        }
    }
}

impl DeviceSettings {
    fn default_vendor_id() -> String {
        "0x0b05".to_string() // ASUSTek
    }

    fn default_product_id() -> String {
        "0x1c76".to_string() // ROG Ryuo IV screen controller
    }

    fn default_write_timeout() -> u64 {
        5000
    }

    fn default_read_timeout() -> u64 {
        5000
    }

    pub fn vendor_id(&self) -> Result<u16> {
        DaemonConfig::parse_hex_id(&self.vendor_id, "VID")
    }

    pub fn product_id(&self) -> Result<u16> {
        DaemonConfig::parse_hex_id(&self.product_id, "PID")
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

/// Protocol timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Delay between handshake and configuration push
    #[serde(default = "SessionConfig::default_settle_delay")]
    pub settle_delay_ms: u64,
    /// Telemetry cadence
    #[serde(default = "SessionConfig::default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Opcode for telemetry pushes; captures show 0x02ED, 0x02EE and 0x02EF
    #[serde(default = "SessionConfig::default_telemetry_opcode")]
    pub telemetry_opcode: Command,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: Self::default_settle_delay(),
            tick_interval_ms: Self::default_tick_interval(),
            telemetry_opcode: Self::default_telemetry_opcode(),
        }
    }
}

impl SessionConfig {
    fn default_settle_delay() -> u64 {
        1000
    }

    fn default_tick_interval() -> u64 {
        1000
    }

    fn default_telemetry_opcode() -> Command {
        Command::TELEMETRY
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// What the water block screen shows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// `Celsius` or `Fahrenheit`
    #[serde(default = "DisplaySettings::default_temperature_unit")]
    pub temperature_unit: String,
    #[serde(default = "DisplaySettings::default_true")]
    pub enable: bool,
    #[serde(default = "DisplaySettings::default_true")]
    pub display_in_sleep: bool,
    /// 0-100
    #[serde(default = "DisplaySettings::default_brightness")]
    pub brightness: u8,
    #[serde(default = "DisplaySettings::default_profile_id")]
    pub profile_id: String,
    #[serde(default = "DisplaySettings::default_screen_mode")]
    pub screen_mode: String,
    #[serde(default = "DisplaySettings::default_play_mode")]
    pub play_mode: String,
    /// Media files already stored on the device
    #[serde(default = "ScreenProfile::default_media")]
    pub media: Vec<String>,
    #[serde(default = "DisplaySettings::default_title_color")]
    pub title_color: String,
    #[serde(default = "DisplaySettings::default_content_color")]
    pub content_color: String,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default = "DisplaySettings::default_filter_opacity")]
    pub filter_opacity: u8,
    #[serde(default)]
    pub badges: Vec<String>,
    /// Telemetry overlays, in display order
    #[serde(default = "DisplaySettings::default_sysinfo_display")]
    pub sysinfo_display: Vec<String>,
    /// IANA timezone for the clock overlay; detected from the host when unset
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            temperature_unit: Self::default_temperature_unit(),
            enable: true,
            display_in_sleep: true,
            brightness: Self::default_brightness(),
            profile_id: Self::default_profile_id(),
            screen_mode: Self::default_screen_mode(),
            play_mode: Self::default_play_mode(),
            media: ScreenProfile::default_media(),
            title_color: Self::default_title_color(),
            content_color: Self::default_content_color(),
            filter: None,
            filter_opacity: Self::default_filter_opacity(),
            badges: Vec::new(),
            sysinfo_display: Self::default_sysinfo_display(),
            timezone: None,
        }
    }
}

impl DisplaySettings {
    fn default_temperature_unit() -> String {
        "Celsius".to_string()
    }

    fn default_true() -> bool {
        true
    }

    fn default_brightness() -> u8 {
        100
    }

    fn default_profile_id() -> String {
        "Customization".to_string()
    }

    fn default_screen_mode() -> String {
        "Full Screen".to_string()
    }

    fn default_play_mode() -> String {
        "Single".to_string()
    }

    fn default_title_color() -> String {
        ScreenSettings::default().title_color
    }

    fn default_content_color() -> String {
        ScreenSettings::default().content_color
    }

    fn default_filter_opacity() -> u8 {
        100
    }

    fn default_sysinfo_display() -> Vec<String> {
        [
            "CPU_USAGE",
            "GPU_USAGE",
            "CPU_TEMPERATURE",
            "DATE_TIME",
            "GPU_TEMPERATURE",
            "MOTHERBOARD_TEMPERATURE",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// Build the configuration push body
    pub fn to_document(&self, spec: HostSpec) -> ConfigDocument {
        let timezone = self
            .timezone
            .clone()
            .unwrap_or_else(|| detect_timezone(Path::new("/etc")));

        ConfigDocument {
            temperature: self.temperature_unit.clone(),
            water_block_screen: WaterBlockScreen {
                enable: self.enable,
                display_in_sleep: self.display_in_sleep,
                brightness: self.brightness,
                id: ScreenProfile {
                    id: self.profile_id.clone(),
                    screen_mode: self.screen_mode.clone(),
                    play_mode: self.play_mode.clone(),
                    media: self.media.clone(),
                    settings: ScreenSettings {
                        title_color: self.title_color.clone(),
                        content_color: self.content_color.clone(),
                        filter: ScreenFilter {
                            value: self.filter.clone(),
                            opacity: self.filter_opacity,
                        },
                        badges: self.badges.clone(),
                    },
                    sysinfo_display: self.sysinfo_display.clone(),
                    timezone,
                },
            },
            spec,
        }
    }
}

/// Host identification and GPU detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSettings {
    /// Overrides the CPU brand reported by the host
    #[serde(default)]
    pub cpu_name: Option<String>,
    /// Look for an NVIDIA GPU at startup
    #[serde(default = "HostSettings::default_detect_gpu")]
    pub detect_gpu: bool,
    #[serde(default = "HostSettings::default_nvidia_smi")]
    pub nvidia_smi: String,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            cpu_name: None,
            detect_gpu: Self::default_detect_gpu(),
            nvidia_smi: Self::default_nvidia_smi(),
        }
    }
}

impl HostSettings {
    fn default_detect_gpu() -> bool {
        true
    }

    fn default_nvidia_smi() -> String {
        "nvidia-smi".to_string()
    }

    pub fn nvidia_smi(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.nvidia_smi).as_ref())
    }
}

/// Timezone name from `/etc/timezone` or the `/etc/localtime` symlink
fn detect_timezone(etc: &Path) -> String {
    if let Ok(tz) = fs::read_to_string(etc.join("timezone")) {
        let tz = tz.trim();
        if !tz.is_empty() {
            return tz.to_string();
        }
    }

    fs::read_link(etc.join("localtime"))
        .ok()
        .and_then(|target| {
            let target = target.to_string_lossy().into_owned();
            target
                .split_once("zoneinfo/")
                .map(|(_, zone)| zone.to_string())
        })
        .unwrap_or_else(|| "UTC".to_string())
}

impl DaemonConfig {
    /// Configuration file to use, if any
    ///
    /// An explicit path is returned as is, so a missing file is reported by
    /// [`DaemonConfig::load`]. Otherwise the standard locations are tried in
    /// order and `None` means the built-in defaults apply.
    pub fn locate(path: Option<PathBuf>) -> Option<PathBuf> {
        let candidates = [
            Self::default_path(),
            PathBuf::from("/etc/ryuo-screen/daemon.toml"),
        ];
        Self::locate_in(path, &candidates)
    }

    fn locate_in(path: Option<PathBuf>, candidates: &[PathBuf]) -> Option<PathBuf> {
        path.or_else(|| candidates.iter().find(|p| p.exists()).cloned())
    }

    /// Load configuration from the specified path
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse and validate TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let config: DaemonConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("ryuo-screen").join("daemon.toml")
        } else {
            PathBuf::from(".config/ryuo-screen/daemon.toml")
        }
    }

    /// Session timing and opcode
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            settle_delay: Duration::from_millis(self.session.settle_delay_ms),
            read_timeout: Duration::from_millis(self.device.read_timeout_ms),
            telemetry_command: self.session.telemetry_opcode,
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.daemon.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.daemon.log_level,
                valid_levels.join(", ")
            ));
        }

        Self::parse_hex_id(&self.device.vendor_id, "VID")?;
        Self::parse_hex_id(&self.device.product_id, "PID")?;

        if self.device.write_timeout_ms == 0 || self.device.read_timeout_ms == 0 {
            return Err(anyhow!("Device timeouts must be greater than 0"));
        }

        if self.session.tick_interval_ms == 0 {
            return Err(anyhow!("tick_interval_ms must be greater than 0"));
        }

        if self.display.brightness > 100 {
            return Err(anyhow!(
                "Invalid brightness {}, must be 0-100",
                self.display.brightness
            ));
        }

        if self.display.filter_opacity > 100 {
            return Err(anyhow!(
                "Invalid filter_opacity {}, must be 0-100",
                self.display.filter_opacity
            ));
        }

        Ok(())
    }

    /// Parse a hex ID (VID or PID) such as `0x0b05`
    pub fn parse_hex_id(id: &str, name: &str) -> Result<u16> {
        let hex_part = id
            .strip_prefix("0x")
            .or_else(|| id.strip_prefix("0X"))
            .ok_or_else(|| {
                anyhow!(
                    "Invalid {} '{}', must start with '0x' (e.g., '0x1234')",
                    name,
                    id
                )
            })?;

        if hex_part.is_empty() || hex_part.len() > 4 {
            return Err(anyhow!(
                "Invalid {} '{}', hex part must be 1-4 digits",
                name,
                id
            ));
        }

        u16::from_str_radix(hex_part, 16)
            .map_err(|_| anyhow!("Invalid {} '{}', not a valid hex number", name, id))
    }
}
