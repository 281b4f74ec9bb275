use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel as xch;
use heading_core::DetectionGate;
use heading_core::mocks::ScriptedSource;
use heading_core::vision::VisionPump;
use heading_traits::{Clock, ManualClock};

#[test]
fn first_usable_frame_wins_and_the_rest_are_dropped() {
    let clock = ManualClock::new();
    let epoch = clock.now();
    let gate = Arc::new(DetectionGate::new());
    let (tx, rx) = xch::unbounded();

    let source = ScriptedSource::new(vec![
        Ok(vec![]),
        Err("blurred".to_string()),
        Ok(vec![
            ScriptedSource::marker_at(8, 0.6),
            ScriptedSource::marker_at(2, 0.3),
        ]),
        Ok(vec![ScriptedSource::marker_at(1, 0.1)]),
        Ok(vec![ScriptedSource::marker_at(1, 0.1)]),
    ]);
    let pump = VisionPump::spawn(
        source,
        gate.clone(),
        tx,
        Some(Duration::from_millis(33)),
        clock.clone(),
    );

    let accepted: Vec<_> = rx.iter().collect();
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].id, 2);
    // Two paced frames went by before the accepted one.
    assert_eq!(accepted[0].observed_at - epoch, Duration::from_millis(66));

    assert_eq!(pump.frames_seen(), 4);
    assert_eq!(pump.frame_errors(), 1);
    assert_eq!(gate.dropped_frames(), 2);
    drop(pump);
    assert_eq!(clock.ms_since(epoch), 5 * 33);
}

#[test]
fn unpaced_pump_drains_the_source() {
    let gate = Arc::new(DetectionGate::suppressed());
    let (tx, rx) = xch::unbounded();
    let source = ScriptedSource::new((0..50).map(|i| Ok(vec![ScriptedSource::marker_at(i, 0.2)])));
    let pump = VisionPump::spawn(source, gate.clone(), tx, None, ManualClock::new());

    assert_eq!(rx.iter().count(), 0);
    assert_eq!(pump.frames_seen(), 50);
    assert_eq!(gate.dropped_frames(), 50);
}
