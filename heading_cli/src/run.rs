//! `heading run`: wire config, robot link and replay source into the
//! navigation runtime and follow its events until done.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use heading_config::{Config, SettingsStore};
use heading_core::{Control, NavError, NavEvent, NavState, NavStats, NavTiming, Runtime, RuntimeParts};
use heading_core::util::frame_period;
use heading_traits::{MonotonicClock, RobotLink};

use crate::vision::ReplaySource;

#[derive(Debug)]
pub struct RunOpts {
    pub replay: PathBuf,
    pub fps: Option<u32>,
    pub cycles: Option<u64>,
    pub simulate: bool,
    pub looping: bool,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    CyclesReached,
    VisionEnded,
    Interrupted,
    Faulted,
}

impl RunEnd {
    const fn as_str(self) -> &'static str {
        match self {
            Self::CyclesReached => "cycles_reached",
            Self::VisionEnded => "vision_ended",
            Self::Interrupted => "interrupted",
            Self::Faulted => "fault",
        }
    }
}

pub fn run_navigation(
    cfg: &Config,
    store: Arc<SettingsStore>,
    opts: &RunOpts,
    shutdown: &Arc<AtomicBool>,
    json: bool,
) -> eyre::Result<()> {
    let fps = opts.fps.unwrap_or(cfg.vision.fps);
    if fps == 0 {
        eyre::bail!("--fps must be > 0");
    }
    let source = ReplaySource::open(&opts.replay, opts.looping)?;
    tracing::info!(
        replay = %opts.replay.display(),
        frames = source.len(),
        fps,
        looping = opts.looping,
        marker_size_m = cfg.vision.marker_size_m,
        "replay loaded"
    );
    let timing = NavTiming {
        tick_ms: cfg.navigator.tick_ms,
        align_ms: cfg.navigator.align_ms,
    };
    let setup = Setup {
        store,
        timing,
        source,
        frame_period: frame_period(fps),
    };

    if opts.simulate {
        return drive(heading_link::SimulatedLink::from_env(), setup, opts, shutdown, json);
    }
    drive_http(cfg, setup, opts, shutdown, json)
}

#[cfg(feature = "http")]
fn drive_http(
    cfg: &Config,
    setup: Setup,
    opts: &RunOpts,
    shutdown: &Arc<AtomicBool>,
    json: bool,
) -> eyre::Result<()> {
    let link = heading_link::HttpLink::new(
        &cfg.robot.base_address,
        cfg.robot.request_timeout_ms.map(Duration::from_millis),
    )
    .map_err(eyre::Report::new)?;
    drive(link, setup, opts, shutdown, json)
}

#[cfg(not(feature = "http"))]
fn drive_http(
    _cfg: &Config,
    _setup: Setup,
    _opts: &RunOpts,
    _shutdown: &Arc<AtomicBool>,
    _json: bool,
) -> eyre::Result<()> {
    eyre::bail!("built without the http feature; use --simulate")
}

struct Setup {
    store: Arc<SettingsStore>,
    timing: NavTiming,
    source: ReplaySource,
    frame_period: Duration,
}

fn drive<L: RobotLink + Send + 'static>(
    link: L,
    setup: Setup,
    opts: &RunOpts,
    shutdown: &Arc<AtomicBool>,
    json: bool,
) -> eyre::Result<()> {
    let rt = Runtime::launch(RuntimeParts {
        link,
        config: setup.store,
        timing: setup.timing,
        source: setup.source,
        frame_period: Some(setup.frame_period),
        clock: MonotonicClock::new(),
    })
    .map_err(eyre::Report::new)?;
    rt.send(Control::Start);

    let mut state = NavState::Idle;
    let mut vision_ended = false;
    let mut fault: Option<NavError> = None;
    let end = loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::warn!("interrupted; halting robot");
            rt.send(Control::Halt);
            break RunEnd::Interrupted;
        }
        match rt.events().recv_timeout(Duration::from_millis(50)) {
            Ok(NavEvent::Transition { from, to }) => {
                state = to;
                if !json {
                    println!("{from} -> {to}");
                }
                if vision_ended && to != NavState::Fault && !to.in_motion() {
                    break RunEnd::VisionEnded;
                }
            }
            Ok(NavEvent::Fault(e)) => {
                fault = Some(e);
                break RunEnd::Faulted;
            }
            Ok(NavEvent::Rejected(e)) => tracing::warn!(error = %e, "control rejected"),
            Ok(NavEvent::Outcome(r)) => {
                tracing::debug!(seq = r.seq, command = %r.command, ok = r.outcome.is_ok(), "outcome");
            }
            Ok(NavEvent::CycleComplete { cycles }) => {
                if !json {
                    println!("cycle {cycles} complete");
                }
                if opts.cycles.is_some_and(|n| cycles >= n) {
                    break RunEnd::CyclesReached;
                }
            }
            Ok(NavEvent::VisionEnded) => {
                tracing::info!(%state, "vision ended");
                vision_ended = true;
                if !state.in_motion() {
                    break RunEnd::VisionEnded;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break RunEnd::VisionEnded,
        }
    };

    let (frames, frame_errors) = rt.vision_counts();
    let stats = rt.shutdown();
    print_summary(end, &stats, frames, frame_errors, json);

    match fault {
        Some(e) => Err(eyre::Report::new(e)),
        None => Ok(()),
    }
}

fn print_summary(end: RunEnd, stats: &NavStats, frames: u64, frame_errors: u64, json: bool) {
    if json {
        let obj = serde_json::json!({
            "end": end.as_str(),
            "cycles": stats.cycles_completed,
            "commands": stats.commands_issued,
            "dispatch_ok": stats.dispatch_ok,
            "dispatch_failures": stats.dispatch_failures,
            "last_reply": stats.last_reply,
            "frames": frames,
            "frame_errors": frame_errors,
            "frames_dropped": stats.frames_dropped,
        });
        println!("{obj}");
    } else {
        println!(
            "run ended ({}): cycles={} commands={} failures={} frames={} frame_errors={} dropped={}",
            end.as_str(),
            stats.cycles_completed,
            stats.commands_issued,
            stats.dispatch_failures,
            frames,
            frame_errors,
            stats.frames_dropped
        );
    }
}
