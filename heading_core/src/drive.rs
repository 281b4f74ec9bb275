//! Per-phase snapshot of drive parameters.

use heading_config::SettingKey;
use heading_traits::ConfigProvider;

/// Values read once at the start of an Approaching or Aligning phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveConfig {
    pub wheel_rpm: u32,
    pub wheel_diameter_mm: f64,
    /// Carried for display; the duration formula does not apply it.
    pub scaling_factor: f64,
    pub move_left: u8,
    pub move_right: u8,
    pub rotate_left: u8,
    pub rotate_right: u8,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            wheel_rpm: 125,
            wheel_diameter_mm: 43.0,
            scaling_factor: 0.62,
            move_left: 75,
            move_right: 75,
            rotate_left: 75,
            rotate_right: 75,
        }
    }
}

impl DriveConfig {
    /// Read every drive key from `provider`; missing or non-finite values
    /// fall back to the built-in defaults.
    pub fn snapshot(provider: &(impl ConfigProvider + ?Sized)) -> Self {
        let read = |k: SettingKey| {
            provider
                .get(k.as_str())
                .filter(|v| v.is_finite())
                .unwrap_or_else(|| k.default_value())
        };
        Self {
            wheel_rpm: to_rpm(read(SettingKey::WheelRpm)),
            wheel_diameter_mm: read(SettingKey::WheelDiameterMm),
            scaling_factor: read(SettingKey::ScalingFactor),
            move_left: to_power(read(SettingKey::MovePowerLeft)),
            move_right: to_power(read(SettingKey::MovePowerRight)),
            rotate_left: to_power(read(SettingKey::RotatePowerLeft)),
            rotate_right: to_power(read(SettingKey::RotatePowerRight)),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_rpm(v: f64) -> u32 {
    v.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Round and clamp into the motor power range 0..=100.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_power(v: f64) -> u8 {
    if !v.is_finite() {
        return 0;
    }
    v.round().clamp(0.0, 100.0) as u8
}
