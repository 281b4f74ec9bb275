//! Background marker pump.
//!
//! Spawns a thread that owns the `MarkerSource`, turns each frame into
//! candidates, offers them to the shared `DetectionGate`, and forwards the
//! accepted marker to the sequencer. Per-frame decode errors are skipped.
//! When the source is exhausted the marker channel disconnects.
//!
//! Each `VisionPump` owns exactly one thread, stopped and joined on drop.
use crossbeam_channel as xch;
use heading_traits::MarkerSource;
use heading_traits::clock::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::detection::{AcquiredMarker, MarkerCandidate};
use crate::gate::DetectionGate;

pub struct VisionPump {
    frames: Arc<AtomicU64>,
    errors: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl VisionPump {
    /// `period` paces frames; `None` pulls as fast as the source yields.
    pub fn spawn<S, C>(
        mut source: S,
        gate: Arc<DetectionGate>,
        markers: xch::Sender<AcquiredMarker>,
        period: Option<Duration>,
        clock: C,
    ) -> Self
    where
        S: MarkerSource + Send + 'static,
        C: Clock + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let frames = Arc::new(AtomicU64::new(0));
        let frames_clone = frames.clone();
        let errors = Arc::new(AtomicU64::new(0));
        let errors_clone = errors.clone();

        let join_handle = std::thread::spawn(move || {
            let mut candidates = Vec::new();
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("vision pump received shutdown signal");
                    break;
                }

                match source.detect() {
                    Ok(None) => {
                        tracing::info!("vision source exhausted");
                        break;
                    }
                    Ok(Some(raw)) => {
                        frames_clone.fetch_add(1, Ordering::Relaxed);
                        candidates.clear();
                        candidates.extend(raw.iter().map(MarkerCandidate::from_raw));
                        if let Some(m) = gate.submit(&candidates, clock.now()) {
                            if markers.send(m).is_err() {
                                tracing::debug!("sequencer disconnected, exiting vision pump");
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        errors_clone.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(error = %e, "frame skipped");
                    }
                }

                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                if let Some(p) = period {
                    clock.sleep(p);
                }
            }
            tracing::trace!("vision pump exiting cleanly");
        });

        Self {
            frames,
            errors,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn frame_errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

impl Drop for VisionPump {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // Exits after the in-flight detect() and sleep return.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("vision pump joined"),
                Err(e) => tracing::warn!(?e, "vision pump panicked during shutdown"),
            }
        }
    }
}
