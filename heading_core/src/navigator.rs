//! The navigation state machine.
//!
//! `Idle -> Detecting -> Approaching -> Aligning -> Detecting`, or `Fault`.
//! The navigator is the single owner of the state and the countdown. It is
//! driven by four inputs (`start`, `on_marker`, `on_tick`, `halt`/`reset`) and
//! only talks to collaborators through the gate, the dispatcher and the
//! config provider.
use std::sync::Arc;
use std::time::Duration;

use heading_traits::ConfigProvider;

use crate::command::{CommandOutcome, RobotCommand};
use crate::detection::AcquiredMarker;
use crate::dispatcher::{Dispatch, DispatchReport};
use crate::drive::DriveConfig;
use crate::error::NavError;
use crate::gate::DetectionGate;
use crate::kinematics::forward_duration_ms;
use crate::status::{NavState, NavStats, NavStatus};

/// Countdown tick period and blind align length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavTiming {
    pub tick_ms: u64,
    pub align_ms: u64,
}

impl Default for NavTiming {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            align_ms: 1000,
        }
    }
}

pub struct Navigator<D: Dispatch> {
    pub(crate) gate: Arc<DetectionGate>,
    pub(crate) dispatch: D,
    pub(crate) config: Arc<dyn ConfigProvider + Send + Sync>,
    pub(crate) timing: NavTiming,
    pub(crate) state: NavState,
    pub(crate) remaining_ms: i64,
    pub(crate) fault: Option<NavError>,
    pub(crate) target: Option<AcquiredMarker>,
    pub(crate) stats: NavStats,
}

impl<D: Dispatch> core::fmt::Debug for Navigator<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Navigator")
            .field("state", &self.state)
            .field("remaining_ms", &self.remaining_ms)
            .field("fault", &self.fault)
            .field("timing", &self.timing)
            .finish()
    }
}

impl<D: Dispatch> Navigator<D> {
    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn fault(&self) -> Option<&NavError> {
        self.fault.as_ref()
    }

    /// Milliseconds left in the current Approaching/Aligning phase.
    pub fn remaining_ms(&self) -> i64 {
        self.remaining_ms
    }

    pub fn timing(&self) -> NavTiming {
        self.timing
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.timing.tick_ms)
    }

    /// Marker driving the current cycle, if any.
    pub fn target(&self) -> Option<&AcquiredMarker> {
        self.target.as_ref()
    }

    pub fn gate(&self) -> &Arc<DetectionGate> {
        &self.gate
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatch
    }

    /// Telemetry snapshot, including frames the gate has dropped.
    pub fn stats(&self) -> NavStats {
        NavStats {
            frames_dropped: self.gate.dropped_frames(),
            ..self.stats.clone()
        }
    }

    /// True while the countdown schedule should be running.
    pub fn wants_ticks(&self) -> bool {
        self.state.in_motion()
    }

    /// Begin (or restart after a fault) marker acquisition.
    pub fn start(&mut self) -> Result<NavStatus, NavError> {
        match self.state {
            NavState::Idle | NavState::Fault => {
                self.fault = None;
                self.target = None;
                self.remaining_ms = 0;
                self.gate.rearm();
                Ok(self.transition(NavState::Detecting))
            }
            s => Err(NavError::State(format!("start() while {s}"))),
        }
    }

    /// Handle a marker accepted by the gate.
    pub fn on_marker(&mut self, marker: AcquiredMarker) -> NavStatus {
        if self.state != NavState::Detecting {
            tracing::debug!(marker_id = marker.id, state = %self.state, "marker ignored");
            return NavStatus::Unchanged;
        }

        let drive = DriveConfig::snapshot(&*self.config);
        let duration_ms = match forward_duration_ms(marker.distance_m, &drive) {
            Ok(ms) => ms,
            Err(e) => return self.enter_fault(NavError::from(e)),
        };
        tracing::info!(
            marker_id = marker.id,
            distance_m = marker.distance_m,
            duration_ms,
            "approach planned"
        );

        self.target = Some(marker);
        self.remaining_ms = i64::try_from(duration_ms).unwrap_or(i64::MAX);
        self.issue(RobotCommand::forward(&drive));
        self.transition(NavState::Approaching)
    }

    /// Advance the countdown by one tick.
    pub fn on_tick(&mut self) -> NavStatus {
        if !self.state.in_motion() {
            return NavStatus::Unchanged;
        }
        let step = i64::try_from(self.timing.tick_ms).unwrap_or(i64::MAX);
        self.remaining_ms = self.remaining_ms.saturating_sub(step);
        if self.remaining_ms > 0 {
            return NavStatus::Unchanged;
        }

        match self.state {
            NavState::Approaching => {
                self.issue(RobotCommand::stop());
                let drive = DriveConfig::snapshot(&*self.config);
                self.issue(RobotCommand::rotate_left(&drive));
                self.remaining_ms = i64::try_from(self.timing.align_ms).unwrap_or(i64::MAX);
                self.transition(NavState::Aligning)
            }
            NavState::Aligning => {
                self.issue(RobotCommand::stop());
                self.target = None;
                self.stats.cycles_completed += 1;
                self.gate.rearm();
                self.transition(NavState::Detecting)
            }
            _ => NavStatus::Unchanged,
        }
    }

    /// Record the completion of a dispatched command. Never changes state.
    pub fn on_outcome(&mut self, report: &DispatchReport) {
        match &report.outcome {
            CommandOutcome::Ok { body } => {
                self.stats.dispatch_ok += 1;
                self.stats.last_reply = Some(body.clone());
            }
            CommandOutcome::Failed(e) => {
                self.stats.dispatch_failures += 1;
                tracing::warn!(
                    seq = report.seq,
                    command = %report.command,
                    error = %e,
                    state = %self.state,
                    "command failed; continuing on schedule"
                );
            }
        }
    }

    /// Operator stop: send Stop if the robot may be moving and go Idle.
    pub fn halt(&mut self) -> NavStatus {
        match self.state {
            NavState::Approaching | NavState::Aligning => {
                self.issue(RobotCommand::stop());
                self.remaining_ms = 0;
                self.target = None;
                self.transition(NavState::Idle)
            }
            NavState::Detecting => self.transition(NavState::Idle),
            NavState::Idle | NavState::Fault => NavStatus::Unchanged,
        }
    }

    /// Clear a fault (or halt) and go Idle.
    pub fn reset(&mut self) -> NavStatus {
        if self.state == NavState::Fault {
            self.fault = None;
            self.target = None;
            return self.transition(NavState::Idle);
        }
        self.halt()
    }

    fn issue(&mut self, cmd: RobotCommand) {
        let seq = self.dispatch.dispatch(cmd);
        self.stats.commands_issued += 1;
        tracing::debug!(seq, command = %cmd, "command issued");
    }

    fn enter_fault(&mut self, err: NavError) -> NavStatus {
        tracing::error!(error = %err, from = %self.state, "navigation fault");
        self.remaining_ms = 0;
        self.target = None;
        self.fault = Some(err.clone());
        self.state = NavState::Fault;
        NavStatus::Faulted(err)
    }

    fn transition(&mut self, to: NavState) -> NavStatus {
        let from = self.state;
        self.state = to;
        tracing::info!(%from, %to, "nav transition");
        NavStatus::Entered(to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NavigatorBuilder;
    use crate::command::CommandKind;
    use crate::mocks::{FixedProvider, RecordingDispatch};
    use std::time::Instant;

    fn nav() -> Navigator<RecordingDispatch> {
        NavigatorBuilder::new()
            .with_dispatch(RecordingDispatch::default())
            .with_config(Arc::new(FixedProvider::default()))
            .try_build()
            .unwrap()
    }

    fn marker(d: f64) -> AcquiredMarker {
        AcquiredMarker {
            id: 1,
            distance_m: d,
            observed_at: Instant::now(),
        }
    }

    #[test]
    fn start_is_rejected_mid_cycle() {
        let mut n = nav();
        n.start().unwrap();
        n.on_marker(marker(0.1));
        assert!(matches!(n.start(), Err(NavError::State(_))));
    }

    #[test]
    fn stale_ticks_do_nothing() {
        let mut n = nav();
        assert_eq!(n.on_tick(), NavStatus::Unchanged);
        n.start().unwrap();
        assert_eq!(n.on_tick(), NavStatus::Unchanged);
        assert!(n.dispatcher().kinds().is_empty());
    }

    #[test]
    fn zero_distance_stops_on_first_tick() {
        let mut n = nav();
        n.start().unwrap();
        n.on_marker(marker(0.0));
        assert_eq!(n.state(), NavState::Approaching);
        assert_eq!(n.on_tick(), NavStatus::Entered(NavState::Aligning));
        assert_eq!(
            n.dispatcher().kinds(),
            vec![CommandKind::Forward, CommandKind::Stop, CommandKind::Left]
        );
    }
}
