//! Common time/period helpers for heading_core.

use std::time::Duration;

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Period in microseconds for a rate in Hz, clamped so neither side is zero.
#[inline]
pub fn period_us(hz: u32) -> u64 {
    (MICROS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Frame pacing for a source running at `fps`.
#[inline]
pub fn frame_period(fps: u32) -> Duration {
    Duration::from_micros(period_us(fps))
}
