use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Én rå posisjonsmåling fra plattformens lokasjonstjeneste.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub altitude_m: Option<f64>,
    pub accuracy_m: f64, // horisontal nøyaktighet (meter)
    #[serde(default)]
    pub speed_mps: Option<f64>, // enhetens egen fart, brukes ikke i filteret
    pub ts_ms: i64,             // monotone millisekunder
}

impl PositionFix {
    pub fn new(lat: f64, lon: f64, accuracy_m: f64, ts_ms: i64) -> Self {
        Self { lat, lon, altitude_m: None, accuracy_m, speed_mps: None, ts_ms }
    }

    pub fn with_altitude(mut self, altitude_m: f64) -> Self {
        self.altitude_m = Some(altitude_m);
        self
    }
}

/// Ett akseptert punkt i sporet. Uforanderlig når det er sendt ut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub ride_id: i64,
    pub ts_ms: i64,
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: Option<f64>,
    pub accuracy_m: Option<f64>,
    pub speed_mps: f64,
    pub segment_distance_m: f64,
}

/// Løpende nøkkeltall for en økt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RideMetrics {
    pub distance_m: f64,
    pub moving_time_s: u64,
    pub stopped_time_s: u64,
    pub avg_speed_mps: f64, // tidsvektet, kun bevegelse
    pub max_speed_mps: f64,
    pub current_speed_mps: f64,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
    pub current_lat: f64,
    pub current_lon: f64,
    pub current_altitude_m: Option<f64>,
}

impl RideMetrics {
    /// Total tid = bevegelse + stillstand (alltid avledet, aldri lagret separat).
    #[inline]
    pub fn total_time_s(&self) -> u64 {
        self.moving_time_s + self.stopped_time_s
    }
}

/// En automatisk oppdaget stopp. `end_ts_ms` er `None` mens stoppet er åpent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub ride_id: i64,
    pub start_ts_ms: i64,
    pub end_ts_ms: Option<i64>,
    pub lat: f64,
    pub lon: f64,
}

impl Stop {
    pub fn is_open(&self) -> bool {
        self.end_ts_ms.is_none()
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.end_ts_ms.map(|end| end.saturating_sub(self.start_ts_ms))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    #[serde(alias = "hr")]
    HeartRate,
    Cadence,
    Power,
}

impl SensorType {
    pub const ALL: [SensorType; 3] = [SensorType::HeartRate, SensorType::Cadence, SensorType::Power];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::HeartRate => "hr",
            SensorType::Cadence => "cadence",
            SensorType::Power => "power",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            SensorType::HeartRate => "bpm",
            SensorType::Cadence => "rpm",
            SensorType::Power => "W",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Én dekodet BLE-notifikasjon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub sensor_type: SensorType,
    pub value: f64,
    pub unit: String,
    pub ts_ms: i64,
    pub device_id: String,
}

impl SensorReading {
    pub fn new(sensor_type: SensorType, value: f64, ts_ms: i64, device_id: &str) -> Self {
        Self {
            sensor_type,
            value,
            unit: sensor_type.unit().to_string(),
            ts_ms,
            device_id: device_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    #[default]
    Idle,
    Tracking,
    Paused,
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrackingState::Idle => "idle",
            TrackingState::Tracking => "tracking",
            TrackingState::Paused => "paused",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    InProgress,
    Paused,
    Completed,
}

/// Sluttført turpost, bygget fra `RideMetrics` når økten stoppes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideSummary {
    pub ride_id: i64,
    pub start_ts_ms: i64,
    pub end_ts_ms: Option<i64>,
    pub status: RideStatus,
    pub distance_m: f64,
    pub total_time_s: u64,
    pub moving_time_s: u64,
    pub stopped_time_s: u64,
    pub avg_speed_mps: f64,
    pub max_speed_mps: f64,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
}

impl RideSummary {
    pub fn from_metrics(
        ride_id: i64,
        start_ts_ms: i64,
        end_ts_ms: Option<i64>,
        status: RideStatus,
        m: &RideMetrics,
    ) -> Self {
        Self {
            ride_id,
            start_ts_ms,
            end_ts_ms,
            status,
            distance_m: m.distance_m,
            total_time_s: m.total_time_s(),
            moving_time_s: m.moving_time_s,
            stopped_time_s: m.stopped_time_s,
            avg_speed_mps: m.avg_speed_mps,
            max_speed_mps: m.max_speed_mps,
            elevation_gain_m: m.elevation_gain_m,
            elevation_loss_m: m.elevation_loss_m,
        }
    }

    /// Starttid som UTC, forutsatt epoch-millisekunder.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.start_ts_ms).single()
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.end_ts_ms.and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }
}
