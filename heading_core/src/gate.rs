//! Reentrancy-guarded marker selection.
//!
//! At most one submission is evaluated at a time; concurrent submissions and
//! submissions while suppressed are dropped, never queued. After a marker is
//! accepted the gate stays suppressed until `rearm()`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use crate::detection::{AcquiredMarker, MarkerCandidate};

#[derive(Debug, Default)]
pub struct DetectionGate {
    busy: AtomicBool,
    suppressed: AtomicBool,
    dropped: AtomicU64,
    acquired: AtomicU64,
}

/// Clears the busy flag on every exit path.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl DetectionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gate that accepts nothing until the first `rearm()`.
    pub fn suppressed() -> Self {
        let gate = Self::default();
        gate.suppressed.store(true, Ordering::Release);
        gate
    }

    /// Offer one frame's candidates.
    pub fn submit(&self, frame: &[MarkerCandidate], observed_at: Instant) -> Option<AcquiredMarker> {
        if self.suppressed.load(Ordering::Acquire) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        let _guard = BusyGuard(&self.busy);

        // Another submitter may have accepted a marker between the two checks.
        if self.suppressed.load(Ordering::Acquire) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let (id, distance_m) = select_nearest(frame)?;
        self.suppressed.store(true, Ordering::Release);
        self.acquired.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(marker_id = id, distance_m, "marker acquired");
        Some(AcquiredMarker {
            id,
            distance_m,
            observed_at,
        })
    }

    /// Re-enable acquisition after a completed approach and align cycle.
    pub fn rearm(&self) {
        self.suppressed.store(false, Ordering::Release);
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::Acquire)
    }

    /// Frames rejected because the gate was busy or suppressed.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn acquisitions(&self) -> u64 {
        self.acquired.load(Ordering::Relaxed)
    }
}

/// Nearest usable candidate; ties go to the lowest id.
pub fn select_nearest(frame: &[MarkerCandidate]) -> Option<(i64, f64)> {
    frame
        .iter()
        .filter_map(MarkerCandidate::usable)
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
}
