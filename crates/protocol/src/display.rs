//! Configuration push document
//!
//! Sent once after the handshake. Describes what the water block screen shows
//! and identifies the host hardware.

use serde::{Deserialize, Serialize};

/// GPU name reported when no discrete GPU was detected
pub const NO_GPU: &str = "No GPU";

/// Body of the configuration push
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    /// Temperature unit shown on screen (`Celsius` or `Fahrenheit`)
    pub temperature: String,
    pub water_block_screen: WaterBlockScreen,
    pub spec: HostSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterBlockScreen {
    pub enable: bool,
    pub display_in_sleep: bool,
    /// 0-100
    pub brightness: u8,
    pub id: ScreenProfile,
}

/// Active screen profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenProfile {
    pub id: String,
    pub screen_mode: String,
    pub play_mode: String,
    /// Media files stored on the device
    pub media: Vec<String>,
    pub settings: ScreenSettings,
    /// Telemetry items overlaid on the media
    pub sysinfo_display: Vec<String>,
    /// IANA timezone for the clock overlay
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenSettings {
    pub title_color: String,
    pub content_color: String,
    pub filter: ScreenFilter,
    pub badges: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenFilter {
    /// Serialized as `null` when unset
    pub value: Option<String>,
    pub opacity: u8,
}

/// Static host identification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSpec {
    pub cpu: String,
    pub gpu: String,
}

impl HostSpec {
    /// Build from a CPU name and an optional discrete GPU name
    pub fn new(cpu: impl Into<String>, gpu: Option<String>) -> Self {
        Self {
            cpu: cpu.into(),
            gpu: gpu.unwrap_or_else(|| NO_GPU.to_string()),
        }
    }
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self {
            title_color: "#00C5F7".to_string(),
            content_color: "#FFFFFF".to_string(),
            filter: ScreenFilter {
                value: None,
                opacity: 100,
            },
            badges: Vec::new(),
        }
    }
}

impl ScreenProfile {
    /// Stock media shipped on the device
    pub fn default_media() -> Vec<String> {
        [
            "Ryuo_IV_MIKU_WW_03.mp4",
            "Ryuo_IV_MIKU_WW_01.mp4",
            "Ryuo_IV_MIKU_WW_02.mp4",
            "Ryuo_IV_MIKU_WW_04.mp4",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConfigDocument {
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
                    media: vec!["a.mp4".to_string()],
                    settings: ScreenSettings::default(),
                    sysinfo_display: vec!["CPU_USAGE".to_string()],
                    timezone: "Europe/Amsterdam".to_string(),
                },
            },
            spec: HostSpec::new("AMD Ryzen 7 7800X3D", None),
        }
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.starts_with(r#"{"temperature":"Celsius","waterBlockScreen":{"enable":true,"displayInSleep":true,"brightness":100,"#));
        assert!(json.contains(r#""screenMode":"Full Screen","playMode":"Single""#));
        assert!(json.contains(r#""filter":{"value":null,"opacity":100},"badges":[]"#));
        assert!(json.contains(r#""sysinfoDisplay":["CPU_USAGE"],"timezone":"Europe/Amsterdam""#));
        assert!(json.ends_with(r#""spec":{"cpu":"AMD Ryzen 7 7800X3D","gpu":"No GPU"}}"#));
    }

    #[test]
    fn test_host_spec_with_gpu() {
        let spec = HostSpec::new("cpu", Some("NVIDIA GeForce RTX 4080".to_string()));
        assert_eq!(spec.gpu, "NVIDIA GeForce RTX 4080");
    }

    #[test]
    fn test_default_media() {
        let media = ScreenProfile::default_media();
        assert_eq!(media.len(), 4);
        assert_eq!(media[0], "Ryuo_IV_MIKU_WW_03.mp4");
    }
}
