//! Runtime key-value settings shared by the operator surface and the
//! navigation loop.
//!
//! Every drive computation takes a fresh snapshot, so a `set` lands on the
//! next computation and never mid-maneuver.
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::RwLock;

use heading_traits::{BoxError, ConfigProvider};
use serde::{Deserialize, Serialize};

use crate::Config;
use crate::atomic::write_atomic;

/// Well-known setting keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingKey {
    WheelRpm,
    WheelDiameterMm,
    ScalingFactor,
    MovePowerLeft,
    MovePowerRight,
    RotatePowerLeft,
    RotatePowerRight,
}

impl SettingKey {
    pub const ALL: [Self; 7] = [
        Self::WheelRpm,
        Self::WheelDiameterMm,
        Self::ScalingFactor,
        Self::MovePowerLeft,
        Self::MovePowerRight,
        Self::RotatePowerLeft,
        Self::RotatePowerRight,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WheelRpm => "wheelRpm",
            Self::WheelDiameterMm => "wheelDiameterMm",
            Self::ScalingFactor => "scalingFactor",
            Self::MovePowerLeft => "movePowerLeft",
            Self::MovePowerRight => "movePowerRight",
            Self::RotatePowerLeft => "rotatePowerLeft",
            Self::RotatePowerRight => "rotatePowerRight",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Built-in value used when nothing else supplied one.
    pub const fn default_value(self) -> f64 {
        match self {
            Self::WheelRpm => 125.0,
            Self::WheelDiameterMm => 43.0,
            Self::ScalingFactor => 0.62,
            Self::MovePowerLeft
            | Self::MovePowerRight
            | Self::RotatePowerLeft
            | Self::RotatePowerRight => 75.0,
        }
    }

    /// The wheel diameter is a physical constant of the chassis.
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::WheelDiameterMm)
    }

    const fn is_power(self) -> bool {
        matches!(
            self,
            Self::MovePowerLeft | Self::MovePowerRight | Self::RotatePowerLeft | Self::RotatePowerRight
        )
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check `value` against the rules for `key`.
///
/// Zero rpm is storable on purpose; the navigator faults on it at compute time.
pub fn check_value(key: SettingKey, value: f64) -> eyre::Result<()> {
    if !value.is_finite() {
        eyre::bail!("{key} must be a finite number, got {value}");
    }
    if key.is_power() {
        if !(0.0..=100.0).contains(&value) {
            eyre::bail!("{key} must be in [0, 100], got {value}");
        }
    } else if key != SettingKey::ScalingFactor && value < 0.0 {
        eyre::bail!("{key} must be >= 0, got {value}");
    }
    Ok(())
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct PersistedSettings {
    #[serde(default)]
    settings: BTreeMap<String, Number>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(untagged)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    #[allow(clippy::cast_precision_loss)]
    const fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }
}

/// In-memory settings with interior mutability.
#[derive(Debug)]
pub struct SettingsStore {
    values: RwLock<BTreeMap<SettingKey, f64>>,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SettingsStore {
    /// Store holding the built-in defaults.
    pub fn with_defaults() -> Self {
        let values = SettingKey::ALL
            .into_iter()
            .map(|k| (k, k.default_value()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }

    /// Seed from the validated file config.
    pub fn from_config(cfg: &Config) -> Self {
        let store = Self::with_defaults();
        let seeded = [
            (SettingKey::WheelRpm, f64::from(cfg.drive.wheel_rpm)),
            (SettingKey::WheelDiameterMm, cfg.drive.wheel_diameter_mm),
            (SettingKey::ScalingFactor, cfg.drive.scaling_factor),
            (SettingKey::MovePowerLeft, f64::from(cfg.power.move_left)),
            (SettingKey::MovePowerRight, f64::from(cfg.power.move_right)),
            (SettingKey::RotatePowerLeft, f64::from(cfg.power.rotate_left)),
            (SettingKey::RotatePowerRight, f64::from(cfg.power.rotate_right)),
        ];
        if let Ok(mut map) = store.values.write() {
            map.extend(seeded);
        }
        store
    }

    pub fn value(&self, key: SettingKey) -> f64 {
        self.values
            .read()
            .ok()
            .and_then(|m| m.get(&key).copied())
            .unwrap_or_else(|| key.default_value())
    }

    /// Validated write for operator-settable keys.
    pub fn set_key(&self, key: SettingKey, value: f64) -> eyre::Result<()> {
        if key.is_read_only() {
            eyre::bail!("{key} is read-only");
        }
        check_value(key, value)?;
        let mut map = self
            .values
            .write()
            .map_err(|_| eyre::eyre!("settings store lock poisoned"))?;
        map.insert(key, value);
        Ok(())
    }

    /// All keys in declaration order with their current values.
    pub fn snapshot(&self) -> Vec<(SettingKey, f64)> {
        SettingKey::ALL
            .into_iter()
            .map(|k| (k, self.value(k)))
            .collect()
    }

    /// Overlay values from a persisted `[settings]` file.
    ///
    /// A missing file is not an error. Unknown or read-only keys and values
    /// that fail validation reject the whole file.
    pub fn load_overrides(&self, path: &Path) -> eyre::Result<usize> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(eyre::Report::new(e)
                    .wrap_err(format!("reading settings file {}", path.display())));
            }
        };
        let parsed: PersistedSettings = toml::from_str(&text)
            .map_err(|e| eyre::eyre!("settings file {}: {e}", path.display()))?;

        let mut staged = Vec::with_capacity(parsed.settings.len());
        for (name, num) in parsed.settings {
            let key = SettingKey::parse(&name)
                .ok_or_else(|| eyre::eyre!("settings file {}: unknown key {name:?}", path.display()))?;
            if key.is_read_only() {
                eyre::bail!("settings file {}: {key} is read-only", path.display());
            }
            let value = num.as_f64();
            check_value(key, value)
                .map_err(|e| eyre::eyre!("settings file {}: {e}", path.display()))?;
            staged.push((key, value));
        }

        let n = staged.len();
        let mut map = self
            .values
            .write()
            .map_err(|_| eyre::eyre!("settings store lock poisoned"))?;
        map.extend(staged);
        Ok(n)
    }

    /// Persist all operator-settable keys to `path` atomically.
    pub fn save(&self, path: &Path) -> eyre::Result<()> {
        let settings = self
            .snapshot()
            .into_iter()
            .filter(|(k, _)| !k.is_read_only())
            .map(|(k, v)| (k.as_str().to_string(), Number::Float(v)))
            .collect();
        let body = toml::to_string(&PersistedSettings { settings })
            .map_err(|e| eyre::eyre!("serializing settings: {e}"))?;
        write_atomic(path, body.as_bytes())
            .map_err(|e| eyre::Report::new(e).wrap_err(format!("writing {}", path.display())))
    }
}

impl ConfigProvider for SettingsStore {
    fn get(&self, key: &str) -> Option<f64> {
        SettingKey::parse(key).map(|k| self.value(k))
    }

    fn set(&self, key: &str, value: f64) -> Result<(), BoxError> {
        let k = SettingKey::parse(key).ok_or_else(|| eyre::eyre!("unknown setting {key:?}"))?;
        self.set_key(k, value).map_err(Into::into)
    }
}
