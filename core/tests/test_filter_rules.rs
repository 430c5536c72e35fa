// tests/test_filter_rules.rs
use trailride_core::*;

// ~1 m nordover ved ekvator
const DEG_PER_M: f64 = 1.0 / 111_194.93;

fn north(m: f64, acc: f64, ts_ms: i64) -> PositionFix {
    PositionFix::new(m * DEG_PER_M, 0.0, acc, ts_ms)
}

fn tracking_engine() -> RideEngine {
    let mut e = RideEngine::with_defaults().unwrap();
    e.start_session(1, 0).unwrap();
    e
}

fn rejection(events: &[EngineEvent]) -> Option<RejectReason> {
    events.iter().find_map(|e| match e {
        EngineEvent::FixRejected { reason, .. } => Some(*reason),
        _ => None,
    })
}

#[test]
fn haversine_symmetry_and_zero() {
    let d1 = distance_m(59.91, 10.75, 60.39, 5.32);
    let d2 = distance_m(60.39, 5.32, 59.91, 10.75);
    assert!((d1 - d2).abs() < 1e-6);
    assert!(d1 > 300_000.0 && d1 < 310_000.0);
    assert_eq!(distance_m(59.91, 10.75, 59.91, 10.75), 0.0);
}

#[test]
fn accuracy_limit_is_inclusive() {
    let mut e = tracking_engine();
    assert_eq!(rejection(&e.ingest_fix(&north(0.0, 31.0, 0))), Some(RejectReason::Accuracy));
    let ev = e.ingest_fix(&north(0.0, 30.0, 0));
    assert!(matches!(ev.as_slice(), [EngineEvent::TrackPointCreated(_)]));
    assert_eq!(e.counters().rejected_count(RejectReason::Accuracy), 1);
}

#[test]
fn first_fix_adds_nothing() {
    let mut e = tracking_engine();
    let ev = e.ingest_fix(&north(0.0, 5.0, 1_000));
    match &ev[0] {
        EngineEvent::TrackPointCreated(p) => {
            assert_eq!(p.segment_distance_m, 0.0);
            assert_eq!(p.speed_mps, 0.0);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(e.metrics().distance_m, 0.0);
    assert_eq!(e.metrics().total_time_s(), 0);
}

#[test]
fn same_timestamp_is_rejected() {
    let mut e = tracking_engine();
    e.ingest_fix(&north(0.0, 5.0, 1_000));
    assert_eq!(rejection(&e.ingest_fix(&north(3.0, 5.0, 1_000))), Some(RejectReason::NonPositiveDt));
    assert_eq!(rejection(&e.ingest_fix(&north(3.0, 5.0, 900))), Some(RejectReason::NonPositiveDt));
}

#[test]
fn jump_inside_window_is_rejected() {
    let mut e = tracking_engine();
    e.ingest_fix(&north(0.0, 5.0, 0));
    assert_eq!(rejection(&e.ingest_fix(&north(100.0, 5.0, 1_500))), Some(RejectReason::Jump));
    assert_eq!(e.metrics().distance_m, 0.0);
}

#[test]
fn long_segment_falls_to_velocity_cap() {
    // 80.1 m på 3 s er utenfor hopp-vinduet, men 26.7 m/s er over fartsgrensen
    let mut e = tracking_engine();
    e.ingest_fix(&north(0.0, 5.0, 0));
    assert_eq!(rejection(&e.ingest_fix(&north(80.1, 5.0, 3_000))), Some(RejectReason::Velocity));

    // samme avstand på 5 s (16 m/s) godtas
    let ev = e.ingest_fix(&north(80.1, 5.0, 5_000));
    match &ev[0] {
        EngineEvent::TrackPointCreated(p) => {
            assert!((p.segment_distance_m - 80.1).abs() < 1e-3);
            assert!((p.speed_mps - 16.02).abs() < 1e-3);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn total_time_is_moving_plus_stopped() {
    let mut e = tracking_engine();
    let mut y = 0.0;
    let mut ts = 0;
    e.ingest_fix(&north(y, 5.0, ts));
    for _ in 0..10 {
        y += 5.0;
        ts += 1_000;
        e.ingest_fix(&north(y, 5.0, ts));
    }
    for _ in 0..5 {
        y += 0.5;
        ts += 1_000;
        e.ingest_fix(&north(y, 5.0, ts));
    }
    let m = e.metrics();
    assert_eq!(m.moving_time_s, 10);
    assert_eq!(m.stopped_time_s, 5);
    assert_eq!(m.total_time_s(), 15);
    assert!((m.distance_m - 52.5).abs() < 1e-3);
    assert!(m.current_speed_mps < 1.0);
}

#[test]
fn average_speed_is_time_weighted() {
    let mut e = tracking_engine();
    e.ingest_fix(&north(0.0, 5.0, 0));
    e.ingest_fix(&north(10.0, 5.0, 1_000)); // 10 m/s i 1 s
    e.ingest_fix(&north(20.0, 5.0, 3_000)); // 5 m/s i 2 s
    let m = e.metrics();
    assert!((m.avg_speed_mps - 20.0 / 3.0).abs() < 1e-3);
    assert!((m.max_speed_mps - 10.0).abs() < 1e-3);
}

#[test]
fn elevation_below_noise_is_ignored() {
    let mut e = tracking_engine();
    let alts = [100.0, 103.0, 101.5, 98.5];
    for (i, alt) in alts.iter().enumerate() {
        let fix = north(i as f64 * 5.0, 5.0, i as i64 * 1_000).with_altitude(*alt);
        e.ingest_fix(&fix);
    }
    let m = e.metrics();
    assert!((m.elevation_gain_m - 3.0).abs() < 1e-9);
    assert!((m.elevation_loss_m - 3.0).abs() < 1e-9);
    assert_eq!(m.current_altitude_m, Some(98.5));
}

#[test]
fn stricter_config_changes_rules() {
    let cfg = EngineConfig { max_accuracy_m: 10.0, ..Default::default() };
    let mut e = RideEngine::new(cfg).unwrap();
    e.start_session(3, 0).unwrap();
    assert_eq!(rejection(&e.ingest_fix(&north(0.0, 12.0, 0))), Some(RejectReason::Accuracy));
}
