#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and the settings store for the heading hub.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `SettingsStore` is the key-value `ConfigProvider` the navigation loop
//!   snapshots drive parameters from; it is seeded from `Config` and can be
//!   overlaid with a persisted settings file.
use serde::Deserialize;

pub mod atomic;
pub mod settings;

pub use settings::{SettingKey, SettingsStore};

#[derive(Debug, Deserialize)]
pub struct RobotCfg {
    /// Base address of the robot's command receiver, e.g. "http://192.168.4.1/".
    pub base_address: String,
    /// Optional overall request timeout (ms). When absent the transport default applies.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DriveCfg {
    pub wheel_rpm: u32,
    /// Physical wheel diameter; not operator-tunable at runtime.
    pub wheel_diameter_mm: f64,
    /// Stored and surfaced, not applied to the duration formula.
    pub scaling_factor: f64,
}

impl Default for DriveCfg {
    fn default() -> Self {
        Self {
            wheel_rpm: 125,
            wheel_diameter_mm: 43.0,
            scaling_factor: 0.62,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PowerCfg {
    pub move_left: u32,
    pub move_right: u32,
    pub rotate_left: u32,
    pub rotate_right: u32,
}

impl Default for PowerCfg {
    fn default() -> Self {
        Self {
            move_left: 75,
            move_right: 75,
            rotate_left: 75,
            rotate_right: 75,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NavigatorCfg {
    /// Countdown tick period (ms).
    pub tick_ms: u64,
    /// Blind correction turn length (ms).
    pub align_ms: u64,
}

impl Default for NavigatorCfg {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            align_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VisionCfg {
    /// Frame pacing for replayed detections.
    pub fps: u32,
    /// Printed marker edge length in meters (pose scale of the vision engine).
    pub marker_size_m: f64,
}

impl Default for VisionCfg {
    fn default() -> Self {
        Self {
            fps: 30,
            marker_size_m: 0.05,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub robot: RobotCfg,
    #[serde(default)]
    pub drive: DriveCfg,
    #[serde(default)]
    pub power: PowerCfg,
    #[serde(default)]
    pub navigator: NavigatorCfg,
    #[serde(default)]
    pub vision: VisionCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Parse and normalise a robot base address.
///
/// Only http/https with a host are accepted. The path always ends in `/` so
/// command names can be joined onto it.
pub fn parse_base_address(s: &str) -> eyre::Result<url::Url> {
    let mut url = url::Url::parse(s.trim())
        .map_err(|e| eyre::eyre!("robot.base_address {s:?} is not a valid URL: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        eyre::bail!("robot.base_address must use http or https, got {:?}", url.scheme());
    }
    if url.host_str().is_none_or(str::is_empty) {
        eyre::bail!("robot.base_address must include a host");
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Robot
        parse_base_address(&self.robot.base_address)?;
        if self.robot.request_timeout_ms == Some(0) {
            eyre::bail!("robot.request_timeout_ms must be >= 1 when set");
        }

        // Drive
        if self.drive.wheel_rpm == 0 {
            eyre::bail!("drive.wheel_rpm must be > 0");
        }
        if !(self.drive.wheel_diameter_mm.is_finite() && self.drive.wheel_diameter_mm > 0.0) {
            eyre::bail!("drive.wheel_diameter_mm must be > 0");
        }
        if !self.drive.scaling_factor.is_finite() {
            eyre::bail!("drive.scaling_factor must be finite");
        }

        // Power
        for (name, v) in [
            ("power.move_left", self.power.move_left),
            ("power.move_right", self.power.move_right),
            ("power.rotate_left", self.power.rotate_left),
            ("power.rotate_right", self.power.rotate_right),
        ] {
            if v > 100 {
                eyre::bail!("{name} must be in [0, 100], got {v}");
            }
        }

        // Navigator
        if self.navigator.tick_ms == 0 {
            eyre::bail!("navigator.tick_ms must be >= 1");
        }
        if self.navigator.align_ms == 0 {
            eyre::bail!("navigator.align_ms must be >= 1");
        }

        // Vision
        if self.vision.fps == 0 {
            eyre::bail!("vision.fps must be > 0");
        }
        if !(self.vision.marker_size_m.is_finite() && self.vision.marker_size_m > 0.0) {
            eyre::bail!("vision.marker_size_m must be > 0");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref() {
            if !matches!(rot, "never" | "daily" | "hourly") {
                eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
            }
        }

        Ok(())
    }
}
