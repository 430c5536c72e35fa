// core/src/replay.rs
use log::warn;
use serde::Deserialize;
use std::io::BufRead;

use crate::ble::CharacteristicKind;
use crate::engine::{EngineEvent, RideEngine};
use crate::error::{ReplayError, SessionError};
use crate::models::{PositionFix, RideSummary};

/// Én linje i en JSON-lines hendelseslogg.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    Start {
        ride_id: i64,
        ts_ms: i64,
    },
    Pause,
    Resume,
    Stop {
        ts_ms: i64,
    },
    Fix(PositionFix),
    Sensor {
        device_id: String,
        characteristic: String,
        payload: String, // hex
        ts_ms: i64,
    },
    Disconnect {
        #[serde(default)]
        device_id: Option<String>, // None => alle
    },
}

/// Tolk karakteristikk som UUID ("2a37") eller navn ("hr", "csc", "power").
pub fn characteristic_from_str(s: &str) -> Option<CharacteristicKind> {
    CharacteristicKind::from_uuid(s).or_else(|| match s.trim().to_ascii_lowercase().as_str() {
        "hr" | "heart_rate" => Some(CharacteristicKind::HeartRate),
        "csc" | "cadence" => Some(CharacteristicKind::Csc),
        "power" => Some(CharacteristicKind::Power),
        _ => None,
    })
}

/// Tomme linjer og `#`-kommentarer gir `None`.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<ReplayEvent>, ReplayError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let mut de = serde_json::Deserializer::from_str(trimmed);
    serde_path_to_error::deserialize(&mut de).map(Some).map_err(|e| ReplayError::Parse {
        line: line_no,
        path: e.path().to_string(),
        message: e.inner().to_string(),
    })
}

#[derive(Debug, Default)]
pub struct ReplayReport {
    pub lines: usize,
    pub events: Vec<EngineEvent>,
    pub invalid_transitions: Vec<(usize, SessionError)>,
    pub unknown_characteristics: usize,
}

impl ReplayReport {
    pub fn summary(&self) -> Option<&RideSummary> {
        self.events.iter().rev().find_map(|e| match e {
            EngineEvent::RideCompleted(s) => Some(s),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(&EngineEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

/// Kjør en hendelseslogg gjennom motoren. Ugyldige overganger og ukjente
/// karakteristikker logges og hoppes over; parse-feil avbryter.
pub fn run_replay<R: BufRead>(reader: R, engine: &mut RideEngine) -> Result<ReplayReport, ReplayError> {
    let mut report = ReplayReport::default();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let Some(event) = parse_line(line_no, &line)? else {
            continue;
        };
        report.lines += 1;

        let result = match event {
            ReplayEvent::Start { ride_id, ts_ms } => engine.start_session(ride_id, ts_ms),
            ReplayEvent::Pause => engine.pause_session(),
            ReplayEvent::Resume => engine.resume_session(),
            ReplayEvent::Stop { ts_ms } => engine.stop_session(ts_ms),
            ReplayEvent::Fix(fix) => Ok(engine.ingest_fix(&fix)),
            ReplayEvent::Sensor { device_id, characteristic, payload, ts_ms } => {
                let Some(kind) = characteristic_from_str(&characteristic) else {
                    warn!("linje {}: ukjent karakteristikk {}", line_no, characteristic);
                    report.unknown_characteristics += 1;
                    continue;
                };
                let bytes = hex::decode(payload.trim())
                    .map_err(|_| ReplayError::Hex { line: line_no, payload: payload.clone() })?;
                Ok(engine.ingest_sensor_notification(&device_id, kind, &bytes, ts_ms))
            }
            ReplayEvent::Disconnect { device_id } => {
                match device_id {
                    Some(id) => engine.disconnect_sensor(&id),
                    None => engine.disconnect_all_sensors(),
                }
                Ok(Vec::new())
            }
        };

        match result {
            Ok(events) => report.events.extend(events),
            Err(e) => {
                warn!("linje {}: {}", line_no, e);
                report.invalid_transitions.push((line_no, e));
            }
        }
    }

    Ok(report)
}
