use std::sync::Arc;
use std::time::{Duration, Instant};

use heading_core::mocks::{FixedProvider, ScriptedLink, ScriptedSource};
use heading_core::{Control, NavEvent, NavState, NavTiming, Runtime, RuntimeParts};
use heading_traits::MonotonicClock;

fn fast_timing() -> NavTiming {
    NavTiming {
        tick_ms: 5,
        align_ms: 20,
    }
}

fn launch(link: ScriptedLink, frames: usize, distance_m: f64) -> Runtime {
    let source = ScriptedSource::new(
        (0..frames).map(|i| Ok(vec![ScriptedSource::marker_at((i % 3) as i64, distance_m)])),
    );
    Runtime::launch(RuntimeParts {
        link,
        config: Arc::new(FixedProvider::default()),
        timing: fast_timing(),
        source,
        frame_period: Some(Duration::from_millis(2)),
        clock: MonotonicClock::new(),
    })
    .expect("launch")
}

fn wait_for(rt: &Runtime, deadline: Duration, mut pred: impl FnMut(&NavEvent) -> bool) -> Vec<NavEvent> {
    let until = Instant::now() + deadline;
    let mut seen = Vec::new();
    while Instant::now() < until {
        if let Ok(ev) = rt.events().recv_timeout(Duration::from_millis(20)) {
            let done = pred(&ev);
            seen.push(ev);
            if done {
                return seen;
            }
        }
    }
    panic!("condition not met; events: {seen:?}");
}

#[test]
fn one_cycle_end_to_end() {
    let link = ScriptedLink::new();
    let rt = launch(link.clone(), 500, 0.01);
    assert!(rt.send(Control::Start));

    let events = wait_for(&rt, Duration::from_secs(5), |e| {
        matches!(e, NavEvent::CycleComplete { cycles: 1 })
    });
    let states: Vec<NavState> = events
        .iter()
        .filter_map(|e| match e {
            NavEvent::Transition { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            NavState::Detecting,
            NavState::Approaching,
            NavState::Aligning,
            NavState::Detecting
        ]
    );

    let stats = rt.shutdown();
    assert!(stats.cycles_completed >= 1);
    let cmds = link.commands();
    assert_eq!(&cmds[..4], &["FORWARD", "STOP", "LEFT", "STOP"]);
}

#[test]
fn vision_errors_are_skipped() {
    let link = ScriptedLink::new();
    let mut frames: Vec<Result<Vec<_>, String>> =
        (0..10).map(|_| Err("decode failed".to_string())).collect();
    frames.extend((0..300).map(|_| Ok(vec![ScriptedSource::marker_at(1, 0.01)])));
    let rt = Runtime::launch(RuntimeParts {
        link: link.clone(),
        config: Arc::new(FixedProvider::default()),
        timing: fast_timing(),
        source: ScriptedSource::new(frames),
        frame_period: Some(Duration::from_millis(2)),
        clock: MonotonicClock::new(),
    })
    .unwrap();
    rt.send(Control::Start);
    wait_for(&rt, Duration::from_secs(5), |e| {
        matches!(e, NavEvent::CycleComplete { .. })
    });
    let (_, errors) = rt.vision_counts();
    assert_eq!(errors, 10);
    drop(rt);
}

#[test]
fn shutdown_mid_approach_sends_stop() {
    let link = ScriptedLink::new();
    // 1 m at default wheels is about 3.5 s of driving.
    let rt = launch(link.clone(), 500, 1.0);
    rt.send(Control::Start);
    wait_for(&rt, Duration::from_secs(5), |e| {
        matches!(
            e,
            NavEvent::Transition {
                to: NavState::Approaching,
                ..
            }
        )
    });
    rt.shutdown();
    assert_eq!(link.commands(), vec!["FORWARD", "STOP"]);
}

#[test]
fn exhausted_source_reports_vision_ended() {
    let rt = launch(ScriptedLink::new(), 3, 0.5);
    wait_for(&rt, Duration::from_secs(5), |e| matches!(e, NavEvent::VisionEnded));
    // Never started, so nothing was acquired.
    assert!(rt.gate().is_suppressed());
    assert_eq!(rt.gate().acquisitions(), 0);
}

#[test]
fn start_mid_cycle_is_rejected() {
    let rt = launch(ScriptedLink::new(), 500, 1.0);
    rt.send(Control::Start);
    wait_for(&rt, Duration::from_secs(5), |e| {
        matches!(
            e,
            NavEvent::Transition {
                to: NavState::Approaching,
                ..
            }
        )
    });
    rt.send(Control::Start);
    wait_for(&rt, Duration::from_secs(5), |e| matches!(e, NavEvent::Rejected(_)));
    rt.send(Control::Halt);
    wait_for(&rt, Duration::from_secs(5), |e| {
        matches!(
            e,
            NavEvent::Transition {
                to: NavState::Idle,
                ..
            }
        )
    });
}
