//! Distance to forward-motion duration.

use std::f64::consts::PI;

use crate::drive::DriveConfig;
use crate::error::KinematicsError;

/// Intermediate quantities of one forward move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveBreakdown {
    pub distance_mm: f64,
    pub circumference_mm: f64,
    pub revolutions: f64,
    pub seconds_per_revolution: f64,
    pub duration_ms: u64,
}

/// Full breakdown of the duration computation for `distance_m`.
pub fn breakdown(distance_m: f64, drive: &DriveConfig) -> Result<MoveBreakdown, KinematicsError> {
    if !distance_m.is_finite() || distance_m < 0.0 {
        return Err(KinematicsError::InvalidDistance(distance_m));
    }
    if drive.wheel_rpm == 0 {
        return Err(KinematicsError::DivisionByZero("wheel rpm"));
    }
    if !(drive.wheel_diameter_mm.is_finite() && drive.wheel_diameter_mm > 0.0) {
        return Err(KinematicsError::DivisionByZero("wheel diameter"));
    }

    let distance_mm = distance_m * 1000.0;
    let circumference_mm = PI * drive.wheel_diameter_mm;
    let revolutions = distance_mm / circumference_mm;
    let seconds_per_revolution = 60.0 / f64::from(drive.wheel_rpm);
    let ms = (revolutions * seconds_per_revolution * 1000.0).round();
    if !ms.is_finite() {
        return Err(KinematicsError::InvalidDistance(distance_m));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let duration_ms = ms as u64;

    Ok(MoveBreakdown {
        distance_mm,
        circumference_mm,
        revolutions,
        seconds_per_revolution,
        duration_ms,
    })
}

/// Time in ms to drive `distance_m` forward.
///
/// `scaling_factor` is not applied.
#[inline]
pub fn forward_duration_ms(distance_m: f64, drive: &DriveConfig) -> Result<u64, KinematicsError> {
    breakdown(distance_m, drive).map(|b| b.duration_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circumference_uses_diameter() {
        let b = breakdown(1.0, &DriveConfig::default()).unwrap();
        assert!((b.circumference_mm - PI * 43.0).abs() < 1e-9);
        assert!((b.seconds_per_revolution - 0.48).abs() < 1e-12);
    }
}
