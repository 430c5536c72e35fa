use std::fmt::Write as _;

use crate::format::{format_date_time, format_distance, format_duration, format_elevation, format_speed_kmh};
use crate::models::{RideSummary, SensorType};
use crate::replay::ReplayReport;
use crate::engine::EngineEvent;

/// Tekstrapport for en sluttført (eller pågående) tur.
pub fn ride_report(summary: &RideSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- Ride {} ---", summary.ride_id);
    let _ = writeln!(out, "Start:      {}", format_date_time(summary.start_ts_ms));
    if let Some(end) = summary.end_ts_ms {
        let _ = writeln!(out, "Slutt:      {}", format_date_time(end));
    }
    let _ = writeln!(out, "Distanse:   {}", format_distance(summary.distance_m));
    let _ = writeln!(out, "Total tid:  {}", format_duration(summary.total_time_s));
    let _ = writeln!(out, "I bevegelse: {}", format_duration(summary.moving_time_s));
    let _ = writeln!(out, "Stopp:      {}", format_duration(summary.stopped_time_s));
    let _ = writeln!(out, "Snittfart:  {}", format_speed_kmh(summary.avg_speed_mps));
    let _ = writeln!(out, "Maksfart:   {}", format_speed_kmh(summary.max_speed_mps));
    let _ = writeln!(
        out,
        "Høyde:      +{} / -{}",
        format_elevation(summary.elevation_gain_m),
        format_elevation(summary.elevation_loss_m)
    );
    out
}

/// Kort oversikt over hva replayen produserte.
pub fn replay_overview(report: &ReplayReport) -> String {
    let points = report.count(|e| matches!(e, EngineEvent::TrackPointCreated(_)));
    let rejected = report.count(|e| matches!(e, EngineEvent::FixRejected { .. }));
    let stops = report.count(|e| matches!(e, EngineEvent::StopOpened(_)));

    let mut out = String::new();
    let _ = writeln!(out, "Linjer: {}  punkter: {}  forkastet: {}  stopp: {}", report.lines, points, rejected, stops);
    for sensor in SensorType::ALL {
        let n = report.count(|e| matches!(e, EngineEvent::SensorReadingProduced(r) if r.sensor_type == sensor));
        if n > 0 {
            let _ = writeln!(out, "  {:<8}{} målinger", sensor.as_str(), n);
        }
    }
    if !report.invalid_transitions.is_empty() {
        let _ = writeln!(out, "Ugyldige overganger: {}", report.invalid_transitions.len());
    }
    out
}
