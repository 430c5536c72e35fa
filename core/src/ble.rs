// core/src/ble.rs
use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::MAX_CADENCE_RPM;
use crate::models::{SensorReading, SensorType};

/// Bluetooth SIG-basen for 16-bits UUID-er.
const SIG_BASE_SUFFIX: &str = "-0000-1000-8000-00805f9b34fb";

pub const HR_MEASUREMENT_UUID: &str = "00002a37-0000-1000-8000-00805f9b34fb";
pub const CSC_MEASUREMENT_UUID: &str = "00002a5b-0000-1000-8000-00805f9b34fb";
pub const POWER_MEASUREMENT_UUID: &str = "00002a63-0000-1000-8000-00805f9b34fb";

// Crank-tid kommer i 1/1024 s
const CRANK_TIME_UNITS_PER_S: f64 = 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacteristicKind {
    HeartRate,
    Csc,
    Power,
}

static BY_SHORT_UUID: Lazy<HashMap<&'static str, CharacteristicKind>> = Lazy::new(|| {
    HashMap::from([
        ("2a37", CharacteristicKind::HeartRate),
        ("2a5b", CharacteristicKind::Csc),
        ("2a63", CharacteristicKind::Power),
    ])
});

impl CharacteristicKind {
    /// Slå opp fra full 128-bits UUID eller kort 16-bits form ("2A37").
    pub fn from_uuid(uuid: &str) -> Option<Self> {
        let u = uuid.trim().to_ascii_lowercase();
        let short = match u.len() {
            4 => u.as_str(),
            36 if u.is_ascii() && u.starts_with("0000") && u.ends_with(SIG_BASE_SUFFIX) => &u[4..8],
            _ => return None,
        };
        BY_SHORT_UUID.get(short).copied()
    }

    pub fn sensor_type(&self) -> SensorType {
        match self {
            CharacteristicKind::HeartRate => SensorType::HeartRate,
            CharacteristicKind::Csc => SensorType::Cadence,
            CharacteristicKind::Power => SensorType::Power,
        }
    }
}

/// Heart Rate Measurement (0x2A37). Bit 0 i flagg velger 16-bit (LE) eller 8-bit verdi.
pub fn decode_heart_rate(payload: &[u8]) -> Option<f64> {
    let flags = *payload.first()?;
    if flags & 0x01 != 0 {
        let b = payload.get(1..3)?;
        Some(u16::from_le_bytes([b[0], b[1]]) as f64)
    } else {
        payload.get(1).map(|&v| v as f64)
    }
}

/// Cycling Power Measurement (0x2A63): bytes 2–3 er signert 16-bit LE watt.
pub fn decode_power(payload: &[u8]) -> Option<f64> {
    let b = payload.get(2..4)?;
    Some(i16::from_le_bytes([b[0], b[1]]) as f64)
}

/// Rå crank-felter fra en CSC-notifikasjon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrankData {
    pub cumulative_revs: u16,
    pub last_event_time: u16, // 1/1024 s
}

/// CSC Measurement (0x2A5B). Bit 1 = crank-data (påkrevd), bit 0 = hjuldata (6 bytes hoppes over).
pub fn parse_crank(payload: &[u8]) -> Option<CrankData> {
    let flags = *payload.first()?;
    if flags & 0x02 == 0 {
        return None;
    }
    let offset = if flags & 0x01 != 0 { 1 + 6 } else { 1 };
    let b = payload.get(offset..offset + 4)?;
    Some(CrankData {
        cumulative_revs: u16::from_le_bytes([b[0], b[1]]),
        last_event_time: u16::from_le_bytes([b[2], b[3]]),
    })
}

/// Kadens-tilstand per tilkoblet enhet.
#[derive(Debug, Clone)]
pub struct CadenceDecoder {
    max_rpm: f64,
    previous: Option<CrankData>,
}

impl Default for CadenceDecoder {
    fn default() -> Self {
        Self::new(MAX_CADENCE_RPM)
    }
}

impl CadenceDecoder {
    pub fn new(max_rpm: f64) -> Self {
        Self { max_rpm, previous: None }
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// RPM fra delta mot forrige sample (16-bit wraparound). Første sample gir `None`.
    /// Tilstanden oppdateres for hvert gyldig sample, også når ingen verdi sendes ut.
    pub fn decode(&mut self, payload: &[u8]) -> Option<f64> {
        let crank = parse_crank(payload)?;
        let prev = self.previous.replace(crank)?;

        let d_revs = crank.cumulative_revs.wrapping_sub(prev.cumulative_revs);
        let d_time = crank.last_event_time.wrapping_sub(prev.last_event_time);
        if d_revs == 0 || d_time == 0 {
            return None;
        }

        let seconds = d_time as f64 / CRANK_TIME_UNITS_PER_S;
        let rpm = (d_revs as f64 / seconds) * 60.0;
        if rpm > 0.0 && rpm < self.max_rpm {
            Some(rpm)
        } else {
            debug!("kadens {:.0} rpm forkastet (grense {:.0})", rpm, self.max_rpm);
            None
        }
    }
}

/// Samler dekoding for alle tilkoblede sensorer. Kadens-tilstand er per enhet.
#[derive(Debug, Clone)]
pub struct SensorHub {
    max_rpm: f64,
    cadence: HashMap<String, CadenceDecoder>,
    latest: HashMap<SensorType, SensorReading>,
}

impl Default for SensorHub {
    fn default() -> Self {
        Self::new(MAX_CADENCE_RPM)
    }
}

impl SensorHub {
    pub fn new(max_rpm: f64) -> Self {
        Self { max_rpm, cadence: HashMap::new(), latest: HashMap::new() }
    }

    pub fn handle(
        &mut self,
        device_id: &str,
        kind: CharacteristicKind,
        payload: &[u8],
        ts_ms: i64,
    ) -> Option<SensorReading> {
        let value = match kind {
            CharacteristicKind::HeartRate => decode_heart_rate(payload),
            CharacteristicKind::Power => decode_power(payload),
            CharacteristicKind::Csc => {
                let max_rpm = self.max_rpm;
                self.cadence
                    .entry(device_id.to_string())
                    .or_insert_with(|| CadenceDecoder::new(max_rpm))
                    .decode(payload)
            }
        }?;

        let reading = SensorReading::new(kind.sensor_type(), value, ts_ms, device_id);
        self.latest.insert(reading.sensor_type, reading.clone());
        Some(reading)
    }

    /// Siste verdi per sensortype.
    pub fn latest(&self, sensor: SensorType) -> Option<&SensorReading> {
        self.latest.get(&sensor)
    }

    pub fn has_cadence_state(&self, device_id: &str) -> bool {
        self.cadence.get(device_id).is_some_and(|d| d.has_previous())
    }

    /// Kast kadens-tilstanden for enheten så en ny tilkobling ikke regner mot gamle deltaer.
    pub fn disconnect(&mut self, device_id: &str) {
        if self.cadence.remove(device_id).is_some() {
            debug!("kadens-tilstand for {} forkastet", device_id);
        }
    }

    pub fn disconnect_all(&mut self) {
        self.cadence.clear();
        self.latest.clear();
    }
}
