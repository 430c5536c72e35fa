// core/src/filter.rs
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::EngineConfig;
use crate::geo::distance_m;
use crate::models::{PositionFix, RideMetrics, TrackPoint};

/// Fartsklasse for et akseptert (ikke-første) fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motion {
    Moving,
    Slow,
}

/// Hvorfor et fix ble forkastet. Regler sjekkes i denne rekkefølgen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    NotTracking,
    Accuracy,
    NonPositiveDt,
    Jump,
    Velocity,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::NotTracking => "not_tracking",
            RejectReason::Accuracy => "accuracy",
            RejectReason::NonPositiveDt => "non_positive_dt",
            RejectReason::Jump => "jump",
            RejectReason::Velocity => "velocity",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedFix {
    pub point: TrackPoint,
    /// `None` for første fix (ingen klassifisering).
    pub motion: Option<Motion>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FixOutcome {
    Accepted(AcceptedFix),
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy)]
struct LastFix {
    lat: f64,
    lon: f64,
    altitude_m: Option<f64>,
    ts_ms: i64,
}

/// Filtrerer rå fixes og akkumulerer nøkkeltall for én økt.
#[derive(Debug, Clone)]
pub struct MetricsAccumulator {
    cfg: EngineConfig,
    ride_id: i64,
    last: Option<LastFix>,
    // tidsvektet snittfart: sum(v*dt) / sum(dt), kun bevegelse
    weighted_speed_sum: f64,
    weighted_time_s: f64,
    metrics: RideMetrics,
}

impl MetricsAccumulator {
    pub fn new(cfg: EngineConfig) -> Self {
        Self {
            cfg,
            ride_id: 0,
            last: None,
            weighted_speed_sum: 0.0,
            weighted_time_s: 0.0,
            metrics: RideMetrics::default(),
        }
    }

    /// Nullstill alt for en ny økt.
    pub fn reset(&mut self, ride_id: i64) {
        self.ride_id = ride_id;
        self.last = None;
        self.weighted_speed_sum = 0.0;
        self.weighted_time_s = 0.0;
        self.metrics = RideMetrics::default();
    }

    /// Glem sist aksepterte fix; neste fix behandles som første fix.
    /// Kumulative tall beholdes.
    pub fn forget_last_fix(&mut self) {
        self.last = None;
        self.metrics.current_speed_mps = 0.0;
    }

    pub fn metrics(&self) -> &RideMetrics {
        &self.metrics
    }

    pub fn ride_id(&self) -> i64 {
        self.ride_id
    }

    pub fn has_last_fix(&self) -> bool {
        self.last.is_some()
    }

    pub fn process_fix(&mut self, fix: &PositionFix) -> FixOutcome {
        // 1) nøyaktighet (NaN feiler også)
        if !(fix.accuracy_m >= 0.0 && fix.accuracy_m <= self.cfg.max_accuracy_m) {
            debug!("fix @{} forkastet: accuracy {:.1} m", fix.ts_ms, fix.accuracy_m);
            return FixOutcome::Rejected(RejectReason::Accuracy);
        }

        // 2) første fix godtas alltid
        let Some(prev) = self.last else {
            return FixOutcome::Accepted(self.accept_first(fix));
        };

        // 3) tid må gå fremover (korrupte tidsstempler kan overflowe i64)
        let dt_s = match fix.ts_ms.checked_sub(prev.ts_ms) {
            Some(dt_ms) if dt_ms > 0 => dt_ms as f64 / 1000.0,
            _ => {
                debug!("fix @{} forkastet: ikke-positiv dt mot @{}", fix.ts_ms, prev.ts_ms);
                return FixOutcome::Rejected(RejectReason::NonPositiveDt);
            }
        };

        let segment_m = distance_m(prev.lat, prev.lon, fix.lat, fix.lon);

        // 4) GPS-hopp: langt segment på kort tid
        if segment_m > self.cfg.max_jump_m && dt_s <= self.cfg.jump_window_s {
            debug!("fix @{} forkastet: hopp {:.1} m på {:.2} s", fix.ts_ms, segment_m, dt_s);
            return FixOutcome::Rejected(RejectReason::Jump);
        }

        // 5) hard fartsgrense
        let speed = segment_m / dt_s;
        if speed > self.cfg.max_speed_mps {
            debug!("fix @{} forkastet: {:.1} m/s over grensen", fix.ts_ms, speed);
            return FixOutcome::Rejected(RejectReason::Velocity);
        }

        let dt_whole = dt_s.trunc() as u64;
        let motion = if speed >= self.cfg.moving_speed_mps { Motion::Moving } else { Motion::Slow };

        let m = &mut self.metrics;
        m.distance_m += segment_m;
        m.current_speed_mps = speed;
        match motion {
            Motion::Moving => {
                m.moving_time_s += dt_whole;
                m.max_speed_mps = m.max_speed_mps.max(speed);
                self.weighted_speed_sum += speed * dt_s;
                self.weighted_time_s += dt_s;
            }
            Motion::Slow => {
                m.stopped_time_s += dt_whole;
            }
        }
        if self.weighted_time_s > 0.0 {
            m.avg_speed_mps = self.weighted_speed_sum / self.weighted_time_s;
        }

        // Høyde: sammenlign kun mot sist aksepterte høyde; små endringer er støy
        if let (Some(prev_alt), Some(alt)) = (prev.altitude_m, fix.altitude_m) {
            let delta = alt - prev_alt;
            if delta.abs() >= self.cfg.elevation_noise_m {
                if delta > 0.0 {
                    m.elevation_gain_m += delta;
                } else {
                    m.elevation_loss_m += delta.abs();
                }
            }
        }

        m.current_lat = fix.lat;
        m.current_lon = fix.lon;
        m.current_altitude_m = fix.altitude_m;

        self.remember(fix);
        FixOutcome::Accepted(AcceptedFix {
            point: self.track_point(fix, speed, segment_m),
            motion: Some(motion),
        })
    }

    fn accept_first(&mut self, fix: &PositionFix) -> AcceptedFix {
        let m = &mut self.metrics;
        m.current_lat = fix.lat;
        m.current_lon = fix.lon;
        m.current_altitude_m = fix.altitude_m;
        m.current_speed_mps = 0.0;

        self.remember(fix);
        AcceptedFix { point: self.track_point(fix, 0.0, 0.0), motion: None }
    }

    fn remember(&mut self, fix: &PositionFix) {
        self.last = Some(LastFix {
            lat: fix.lat,
            lon: fix.lon,
            altitude_m: fix.altitude_m,
            ts_ms: fix.ts_ms,
        });
    }

    fn track_point(&self, fix: &PositionFix, speed_mps: f64, segment_distance_m: f64) -> TrackPoint {
        TrackPoint {
            ride_id: self.ride_id,
            ts_ms: fix.ts_ms,
            lat: fix.lat,
            lon: fix.lon,
            altitude_m: fix.altitude_m,
            accuracy_m: Some(fix.accuracy_m),
            speed_mps,
            segment_distance_m,
        }
    }
}
