// tests/test_engine_session.rs
use std::thread;

use trailride_core::*;

const DEG_PER_M: f64 = 1.0 / 111_194.93;

fn at(m: f64, ts_ms: i64) -> PositionFix {
    PositionFix::new(m * DEG_PER_M, 0.0, 5.0, ts_ms)
}

fn stop_events(events: &[EngineEvent]) -> Vec<&EngineEvent> {
    events
        .iter()
        .filter(|e| matches!(e, EngineEvent::StopOpened(_) | EngineEvent::StopClosed(_)))
        .collect()
}

/// Første fix ved t=0, deretter sakte fixes hvert sekund fra t=1 s.
fn engine_with_slow_run(last_ts: i64) -> (RideEngine, Vec<EngineEvent>) {
    let mut e = RideEngine::with_defaults().unwrap();
    e.start_session(7, 0).unwrap();
    let mut events = e.ingest_fix(&at(0.0, 0));
    let mut y = 0.0;
    let mut ts = 1_000;
    while ts <= 15_000 {
        y += 0.1;
        events.extend(e.ingest_fix(&at(y, ts)));
        ts += 1_000;
    }
    y += 0.01;
    events.extend(e.ingest_fix(&at(y, last_ts)));
    (e, events)
}

#[test]
fn invalid_transitions_leave_state_unchanged() {
    let mut e = RideEngine::with_defaults().unwrap();
    assert_eq!(
        e.pause_session().unwrap_err(),
        SessionError::InvalidTransition { from: TrackingState::Idle, action: SessionAction::Pause }
    );
    assert!(e.resume_session().is_err());
    assert!(e.stop_session(0).is_err());
    assert_eq!(e.state(), TrackingState::Idle);

    e.start_session(1, 0).unwrap();
    assert_eq!(
        e.start_session(2, 10).unwrap_err(),
        SessionError::InvalidTransition { from: TrackingState::Tracking, action: SessionAction::Start }
    );
    assert!(e.resume_session().is_err());
    assert_eq!(e.state(), TrackingState::Tracking);
    assert_eq!(e.ride_id(), Some(1));
}

#[test]
fn fixes_outside_tracking_are_rejected() {
    let mut e = RideEngine::with_defaults().unwrap();
    let ev = e.ingest_fix(&at(0.0, 0));
    assert_eq!(ev, vec![EngineEvent::FixRejected { reason: RejectReason::NotTracking, ts_ms: 0 }]);

    e.start_session(1, 0).unwrap();
    e.ingest_fix(&at(0.0, 0));
    e.pause_session().unwrap();
    let ev = e.ingest_fix(&at(5.0, 1_000));
    assert!(matches!(ev[0], EngineEvent::FixRejected { reason: RejectReason::NotTracking, .. }));
    assert_eq!(e.metrics().distance_m, 0.0);
}

#[test]
fn resume_discards_stale_fix() {
    let mut e = RideEngine::with_defaults().unwrap();
    e.start_session(1, 0).unwrap();
    e.ingest_fix(&at(0.0, 0));
    e.ingest_fix(&at(5.0, 1_000));
    let before = e.metrics().distance_m;

    let ev = e.pause_session().unwrap();
    assert_eq!(
        ev,
        vec![EngineEvent::SessionStateChanged(Transition {
            from: TrackingState::Tracking,
            to: TrackingState::Paused
        })]
    );
    e.resume_session().unwrap();
    assert_eq!(e.metrics().current_speed_mps, 0.0);

    // 10 min senere og 500 m unna: ny start, ikke et segment over pausen
    let ev = e.ingest_fix(&at(505.0, 601_000));
    match &ev[0] {
        EngineEvent::TrackPointCreated(p) => assert_eq!(p.segment_distance_m, 0.0),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(e.metrics().distance_m, before);
    assert_eq!(e.metrics().total_time_s(), 1);
}

#[test]
fn auto_stop_needs_full_delay() {
    // 14.9 s sakte: ingen stopp
    let (e, events) = engine_with_slow_run(15_900);
    assert!(stop_events(&events).is_empty());
    assert!(e.open_stop().is_none());

    // 15.0 s sakte: stopp åpnes fra første sakte fix
    let (e, events) = engine_with_slow_run(16_000);
    let stops = stop_events(&events);
    assert_eq!(stops.len(), 1);
    match stops[0] {
        EngineEvent::StopOpened(s) => {
            assert_eq!(s.start_ts_ms, 1_000);
            assert_eq!(s.ride_id, 7);
            assert!(s.is_open());
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(e.open_stop().is_some());
    assert_eq!(e.counters().stops_opened_count(), 1);
}

#[test]
fn stop_opens_once_and_closes_on_movement() {
    let (mut e, _) = engine_with_slow_run(16_000);
    let ev = e.ingest_fix(&at(1.52, 17_000));
    assert!(stop_events(&ev).is_empty(), "ingen ny stopp mens en er åpen");

    let ev = e.ingest_fix(&at(10.0, 18_000));
    assert!(matches!(ev[0], EngineEvent::TrackPointCreated(_)));
    match &ev[1] {
        EngineEvent::StopClosed(s) => {
            assert_eq!(s.end_ts_ms, Some(18_000));
            assert_eq!(s.duration_ms(), Some(17_000));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(e.open_stop().is_none());
}

#[test]
fn stop_session_closes_open_stop_and_completes_ride() {
    let (mut e, _) = engine_with_slow_run(16_000);
    let ev = e.stop_session(20_000).unwrap();
    assert_eq!(ev.len(), 3);
    match &ev[0] {
        EngineEvent::StopClosed(s) => assert_eq!(s.end_ts_ms, Some(20_000)),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(
        ev[1],
        EngineEvent::SessionStateChanged(Transition { from: TrackingState::Tracking, to: TrackingState::Idle })
    );
    let summary = match &ev[2] {
        EngineEvent::RideCompleted(s) => s.clone(),
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(summary.ride_id, 7);
    assert_eq!(summary.status, RideStatus::Completed);
    assert_eq!(summary.end_ts_ms, Some(20_000));
    assert_eq!(summary.total_time_s, summary.moving_time_s + summary.stopped_time_s);
    assert_eq!(e.summary(), Some(summary));
    assert_eq!(e.state(), TrackingState::Idle);
}

#[test]
fn stop_while_paused_closes_open_stop() {
    let (mut e, _) = engine_with_slow_run(16_000);
    e.pause_session().unwrap();
    assert!(e.open_stop().is_some(), "pause lukker ikke stoppet");

    let ev = e.stop_session(30_000).unwrap();
    assert_eq!(ev.len(), 3);
    match &ev[0] {
        EngineEvent::StopClosed(s) => assert_eq!(s.end_ts_ms, Some(30_000)),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(
        ev[1],
        EngineEvent::SessionStateChanged(Transition { from: TrackingState::Paused, to: TrackingState::Idle })
    );
    assert!(matches!(ev[2], EngineEvent::RideCompleted(_)));
    assert!(e.open_stop().is_none());
}

#[test]
fn stop_end_never_precedes_stop_start() {
    // stoppet startet ved 1 000 ms; en eldre sluttid klemmes
    let (mut e, _) = engine_with_slow_run(16_000);
    let ev = e.stop_session(500).unwrap();
    match &ev[0] {
        EngineEvent::StopClosed(s) => {
            assert_eq!(s.end_ts_ms, Some(1_000));
            assert_eq!(s.duration_ms(), Some(0));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn corrupt_fix_timestamp_does_not_end_session() {
    let mut e = RideEngine::with_defaults().unwrap();
    e.start_session(5, 0).unwrap();
    e.ingest_fix(&at(0.0, i64::MIN));
    let ev = e.ingest_fix(&at(5.0, 1_000));
    assert_eq!(ev, vec![EngineEvent::FixRejected { reason: RejectReason::NonPositiveDt, ts_ms: 1_000 }]);
    assert_eq!(e.state(), TrackingState::Tracking);

    // pause/resume gir ny referanse, og økten fortsetter normalt
    e.pause_session().unwrap();
    e.resume_session().unwrap();
    e.ingest_fix(&at(0.0, 2_000));
    e.ingest_fix(&at(5.0, 3_000));
    assert!((e.metrics().distance_m - 5.0).abs() < 1e-3);
}

#[test]
fn stop_from_paused_is_allowed() {
    let mut e = RideEngine::with_defaults().unwrap();
    e.start_session(4, 0).unwrap();
    e.pause_session().unwrap();
    assert_eq!(e.summary().map(|s| s.status), Some(RideStatus::Paused));
    let ev = e.stop_session(5_000).unwrap();
    assert!(matches!(ev.last(), Some(EngineEvent::RideCompleted(_))));
}

#[test]
fn new_session_resets_metrics() {
    let mut e = RideEngine::with_defaults().unwrap();
    e.start_session(1, 0).unwrap();
    e.ingest_fix(&at(0.0, 0));
    e.ingest_fix(&at(5.0, 1_000));
    e.stop_session(2_000).unwrap();

    e.start_session(2, 10_000).unwrap();
    assert_eq!(e.metrics(), &RideMetrics::default());
    assert_eq!(e.summary().map(|s| s.status), Some(RideStatus::InProgress));
}

#[test]
fn events_serialize_with_tag() {
    let ev = EngineEvent::FixRejected { reason: RejectReason::Jump, ts_ms: 12 };
    let v: serde_json::Value = serde_json::to_value(&ev).unwrap();
    assert_eq!(v["event"], "fix_rejected");
    assert_eq!(v["reason"], "jump");
}

#[test]
fn shared_engine_accepts_concurrent_sources() {
    let mut engine = RideEngine::with_defaults().unwrap();
    engine.start_session(9, 0).unwrap();
    let shared = SharedRideEngine::new(engine);

    let gps = {
        let s = shared.clone();
        thread::spawn(move || {
            for i in 0..50 {
                s.ingest_fix(&at(i as f64 * 5.0, i * 1_000));
            }
        })
    };
    let hr = {
        let s = shared.clone();
        thread::spawn(move || {
            for i in 0..50 {
                s.ingest_sensor_notification("hr-1", CharacteristicKind::HeartRate, &[0x00, 140], i * 1_000);
            }
        })
    };
    gps.join().unwrap();
    hr.join().unwrap();

    let m = shared.metrics();
    assert!((m.distance_m - 245.0).abs() < 1e-3);
    assert_eq!(m.moving_time_s, 49);
    assert_eq!(shared.state(), TrackingState::Tracking);
    let latest = shared.with(|e| e.latest_reading(SensorType::HeartRate).cloned());
    assert_eq!(latest.map(|r| r.value), Some(140.0));
}
