//! Sequencer thread and runtime wiring.
//!
//! The sequencer is the only thread that touches the `Navigator`. It selects
//! over operator control messages, markers accepted by the gate, dispatch
//! reports, and the countdown ticker. The ticker exists only while the
//! navigator is in motion; leaving Approaching/Aligning drops it, so no tick
//! can fire afterwards.
use crossbeam_channel as xch;
use heading_traits::clock::Clock;
use heading_traits::{ConfigProvider, MarkerSource, RobotLink};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::detection::AcquiredMarker;
use crate::dispatcher::{CommandDispatcher, Dispatch, DispatchReport};
use crate::error::{BuildError, NavError};
use crate::gate::DetectionGate;
use crate::navigator::{NavTiming, Navigator};
use crate::status::{NavState, NavStats, NavStatus};
use crate::vision::VisionPump;

/// Operator input to the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Start,
    Halt,
    Reset,
    /// Halt, then stop the sequencer.
    Shutdown,
}

/// Observable output of the sequencer.
#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    Transition { from: NavState, to: NavState },
    Fault(NavError),
    /// A control message the navigator refused (e.g. `Start` mid-cycle).
    Rejected(NavError),
    Outcome(DispatchReport),
    CycleComplete { cycles: u64 },
    VisionEnded,
}

/// Handle to a running sequencer. Dropping it shuts the sequencer down.
pub struct NavigationHandle {
    control: xch::Sender<Control>,
    events: xch::Receiver<NavEvent>,
    join_handle: Option<JoinHandle<NavStats>>,
}

impl NavigationHandle {
    /// Returns false once the sequencer has exited.
    pub fn send(&self, c: Control) -> bool {
        self.control.send(c).is_ok()
    }

    pub fn events(&self) -> &xch::Receiver<NavEvent> {
        &self.events
    }

    /// Halt, stop the sequencer, and return its final stats.
    pub fn shutdown(mut self) -> NavStats {
        let _ = self.control.send(Control::Shutdown);
        self.join_handle
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default()
    }
}

impl Drop for NavigationHandle {
    fn drop(&mut self) {
        let _ = self.control.send(Control::Shutdown);
        if let Some(h) = self.join_handle.take() {
            if let Err(e) = h.join() {
                tracing::warn!(?e, "sequencer thread panicked during shutdown");
            }
        }
    }
}

/// Run `nav` on its own thread.
pub fn spawn_sequencer<D: Dispatch + Send + 'static>(
    nav: Navigator<D>,
    markers: xch::Receiver<AcquiredMarker>,
    outcomes: xch::Receiver<DispatchReport>,
) -> NavigationHandle {
    let (control_tx, control_rx) = xch::unbounded();
    let (events_tx, events_rx) = xch::unbounded();
    let join_handle =
        std::thread::spawn(move || sequence(nav, &control_rx, markers, outcomes, &events_tx));
    NavigationHandle {
        control: control_tx,
        events: events_rx,
        join_handle: Some(join_handle),
    }
}

fn sequence<D: Dispatch>(
    mut nav: Navigator<D>,
    control: &xch::Receiver<Control>,
    markers: xch::Receiver<AcquiredMarker>,
    outcomes: xch::Receiver<DispatchReport>,
    events: &xch::Sender<NavEvent>,
) -> NavStats {
    let mut ticker: Option<xch::Receiver<std::time::Instant>> = None;
    let mut markers_open = true;
    let mut outcomes_open = true;
    let mut exiting = false;

    while !exiting {
        if nav.wants_ticks() {
            if ticker.is_none() {
                ticker = Some(xch::tick(nav.tick_period()));
            }
        } else {
            ticker = None;
        }
        let tick_rx = ticker.clone().unwrap_or_else(xch::never);
        let marker_rx = if markers_open { markers.clone() } else { xch::never() };
        let outcome_rx = if outcomes_open { outcomes.clone() } else { xch::never() };

        let before = nav.state();
        let status = xch::select! {
            recv(control) -> msg => match msg {
                Ok(Control::Start) => match nav.start() {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::warn!(error = %e, "start rejected");
                        let _ = events.send(NavEvent::Rejected(e));
                        NavStatus::Unchanged
                    }
                },
                Ok(Control::Halt) => nav.halt(),
                Ok(Control::Reset) => nav.reset(),
                Ok(Control::Shutdown) | Err(_) => {
                    exiting = true;
                    nav.halt()
                }
            },
            recv(marker_rx) -> msg => match msg {
                Ok(m) => nav.on_marker(m),
                Err(_) => {
                    markers_open = false;
                    let _ = events.send(NavEvent::VisionEnded);
                    NavStatus::Unchanged
                }
            },
            recv(outcome_rx) -> msg => match msg {
                Ok(report) => {
                    nav.on_outcome(&report);
                    let _ = events.send(NavEvent::Outcome(report));
                    NavStatus::Unchanged
                }
                Err(_) => {
                    outcomes_open = false;
                    NavStatus::Unchanged
                }
            },
            recv(tick_rx) -> _ => nav.on_tick(),
        };
        emit(events, before, &status, &nav);
    }

    tracing::debug!("sequencer exiting");
    nav.stats()
}

fn emit<D: Dispatch>(
    events: &xch::Sender<NavEvent>,
    before: NavState,
    status: &NavStatus,
    nav: &Navigator<D>,
) {
    match status {
        NavStatus::Unchanged => {}
        NavStatus::Entered(to) => {
            let _ = events.send(NavEvent::Transition { from: before, to: *to });
            if before == NavState::Aligning && *to == NavState::Detecting {
                let _ = events.send(NavEvent::CycleComplete {
                    cycles: nav.stats().cycles_completed,
                });
            }
        }
        NavStatus::Faulted(e) => {
            let _ = events.send(NavEvent::Transition {
                from: before,
                to: NavState::Fault,
            });
            let _ = events.send(NavEvent::Fault(e.clone()));
        }
    }
}

/// Everything a live run needs: sequencer, dispatcher worker, vision pump.
pub struct Runtime {
    // Field order is drop order: stop the pump before the sequencer.
    vision: Option<VisionPump>,
    handle: NavigationHandle,
    gate: Arc<DetectionGate>,
}

/// Inputs to [`Runtime::launch`].
pub struct RuntimeParts<L, S, C> {
    pub link: L,
    pub config: Arc<dyn ConfigProvider + Send + Sync>,
    pub timing: NavTiming,
    pub source: S,
    pub frame_period: Option<Duration>,
    pub clock: C,
}

impl Runtime {
    pub fn launch<L, S, C>(parts: RuntimeParts<L, S, C>) -> Result<Self, BuildError>
    where
        L: RobotLink + Send + 'static,
        S: MarkerSource + Send + 'static,
        C: Clock + Send + 'static,
    {
        // Nothing is acquired before the navigator's first start().
        let gate = Arc::new(DetectionGate::suppressed());
        let (report_tx, report_rx) = xch::unbounded();
        let (marker_tx, marker_rx) = xch::unbounded();

        let nav = Navigator::builder()
            .with_gate(gate.clone())
            .with_dispatch(CommandDispatcher::spawn(parts.link, report_tx))
            .with_config(parts.config)
            .with_timing(parts.timing)
            .try_build()?;
        let handle = spawn_sequencer(nav, marker_rx, report_rx);
        let vision = VisionPump::spawn(
            parts.source,
            gate.clone(),
            marker_tx,
            parts.frame_period,
            parts.clock,
        );

        Ok(Self {
            vision: Some(vision),
            handle,
            gate,
        })
    }

    pub fn send(&self, c: Control) -> bool {
        self.handle.send(c)
    }

    pub fn events(&self) -> &xch::Receiver<NavEvent> {
        self.handle.events()
    }

    pub fn gate(&self) -> &Arc<DetectionGate> {
        &self.gate
    }

    /// Frames decoded and frames skipped on decode errors, so far.
    pub fn vision_counts(&self) -> (u64, u64) {
        self.vision
            .as_ref()
            .map_or((0, 0), |v| (v.frames_seen(), v.frame_errors()))
    }

    /// Stop vision, halt the robot, and return final stats.
    pub fn shutdown(mut self) -> NavStats {
        drop(self.vision.take());
        self.handle.shutdown()
    }
}
