// core/src/engine.rs
use log::{debug, info};
use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::autostop::{AutoStopDetector, StopEvent};
use crate::ble::{CharacteristicKind, SensorHub};
use crate::config::EngineConfig;
use crate::counters::Counters;
use crate::error::{EngineError, SessionError};
use crate::filter::{FixOutcome, Motion, MetricsAccumulator, RejectReason};
use crate::models::{
    PositionFix, RideMetrics, RideStatus, RideSummary, SensorReading, SensorType, Stop, TrackPoint,
    TrackingState,
};
use crate::session::{SessionAction, SessionStateMachine, Transition};

/// Alt motoren sender ut. Returneres synkront fra hvert kall.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    TrackPointCreated(TrackPoint),
    StopOpened(Stop),
    StopClosed(Stop),
    SensorReadingProduced(SensorReading),
    SessionStateChanged(Transition),
    FixRejected { reason: RejectReason, ts_ms: i64 },
    RideCompleted(RideSummary),
}

impl From<StopEvent> for EngineEvent {
    fn from(e: StopEvent) -> Self {
        match e {
            StopEvent::Opened(s) => EngineEvent::StopOpened(s),
            StopEvent::Closed(s) => EngineEvent::StopClosed(s),
        }
    }
}

/// Sanntidsmotor for én økt: filter + akkumulator, auto-stopp, øktstatus og BLE-dekoding.
/// All mutasjon går via `&mut self`, så hver hendelse er en atomisk arbeidsenhet.
#[derive(Debug)]
pub struct RideEngine {
    cfg: EngineConfig,
    session: SessionStateMachine,
    accumulator: MetricsAccumulator,
    autostop: AutoStopDetector,
    sensors: SensorHub,
    counters: Counters,
    ride_id: Option<i64>,
    start_ts_ms: i64,
    last_summary: Option<RideSummary>,
}

impl RideEngine {
    pub fn new(cfg: EngineConfig) -> Result<Self, EngineError> {
        cfg.validate()?;
        let counters = Counters::new()?;
        Ok(Self {
            session: SessionStateMachine::new(),
            accumulator: MetricsAccumulator::new(cfg.clone()),
            autostop: AutoStopDetector::new(cfg.auto_stop_delay_ms),
            sensors: SensorHub::new(cfg.max_cadence_rpm),
            counters,
            ride_id: None,
            start_ts_ms: 0,
            last_summary: None,
            cfg,
        })
    }

    pub fn with_defaults() -> Result<Self, EngineError> {
        Self::new(EngineConfig::default())
    }

    // --- lesetilgang ---------------------------------------------------------

    pub fn state(&self) -> TrackingState {
        self.session.state()
    }

    pub fn metrics(&self) -> &RideMetrics {
        self.accumulator.metrics()
    }

    pub fn ride_id(&self) -> Option<i64> {
        self.ride_id
    }

    pub fn open_stop(&self) -> Option<&Stop> {
        self.autostop.open_stop()
    }

    pub fn latest_reading(&self, sensor: SensorType) -> Option<&SensorReading> {
        self.sensors.latest(sensor)
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Øyeblikksbilde av turen. Etter stopp: den sluttførte turen.
    pub fn summary(&self) -> Option<RideSummary> {
        let status = match self.state() {
            TrackingState::Tracking => RideStatus::InProgress,
            TrackingState::Paused => RideStatus::Paused,
            TrackingState::Idle => return self.last_summary.clone(),
        };
        let ride_id = self.ride_id?;
        Some(RideSummary::from_metrics(ride_id, self.start_ts_ms, None, status, self.metrics()))
    }

    // --- øktkontroll ---------------------------------------------------------

    fn transition(&mut self, action: SessionAction) -> Result<EngineEvent, SessionError> {
        let t = self.session.apply(action)?;
        self.counters.transition(t.to);
        Ok(EngineEvent::SessionStateChanged(t))
    }

    /// Idle → Tracking. Nullstiller akkumulator og auto-stopp.
    pub fn start_session(&mut self, ride_id: i64, now_ms: i64) -> Result<Vec<EngineEvent>, SessionError> {
        let ev = self.transition(SessionAction::Start)?;
        self.accumulator.reset(ride_id);
        self.autostop.reset(ride_id);
        self.ride_id = Some(ride_id);
        self.start_ts_ms = now_ms;
        self.last_summary = None;
        info!("tur {} startet @{}", ride_id, now_ms);
        Ok(vec![ev])
    }

    /// Tracking → Paused. Tall beholdes.
    pub fn pause_session(&mut self) -> Result<Vec<EngineEvent>, SessionError> {
        Ok(vec![self.transition(SessionAction::Pause)?])
    }

    /// Paused → Tracking. Sist aksepterte fix og sakte-timer forkastes, så dt
    /// aldri regnes over pausen.
    pub fn resume_session(&mut self) -> Result<Vec<EngineEvent>, SessionError> {
        let ev = self.transition(SessionAction::Resume)?;
        self.accumulator.forget_last_fix();
        self.autostop.clear_slow_timer();
        Ok(vec![ev])
    }

    /// Tracking|Paused → Idle. Lukker åpen stopp og sluttfører turen.
    pub fn stop_session(&mut self, now_ms: i64) -> Result<Vec<EngineEvent>, SessionError> {
        let ev = self.transition(SessionAction::Stop)?;
        let mut events: Vec<EngineEvent> = Vec::with_capacity(3);
        if let Some(closed) = self.autostop.close(now_ms) {
            events.push(closed.into());
        }
        events.push(ev);

        let summary = RideSummary::from_metrics(
            self.ride_id.unwrap_or_default(),
            self.start_ts_ms,
            Some(now_ms),
            RideStatus::Completed,
            self.metrics(),
        );
        info!(
            "tur {} ferdig: {:.0} m, {} s i bevegelse",
            summary.ride_id, summary.distance_m, summary.moving_time_s
        );
        self.last_summary = Some(summary.clone());
        events.push(EngineEvent::RideCompleted(summary));
        Ok(events)
    }

    // --- inndata -------------------------------------------------------------

    pub fn ingest_fix(&mut self, fix: &PositionFix) -> Vec<EngineEvent> {
        if !self.session.accepts_fixes() {
            self.counters.fix_rejected(RejectReason::NotTracking);
            return vec![EngineEvent::FixRejected { reason: RejectReason::NotTracking, ts_ms: fix.ts_ms }];
        }

        let accepted = match self.accumulator.process_fix(fix) {
            FixOutcome::Accepted(a) => a,
            FixOutcome::Rejected(reason) => {
                self.counters.fix_rejected(reason);
                return vec![EngineEvent::FixRejected { reason, ts_ms: fix.ts_ms }];
            }
        };
        self.counters.fix_accepted();

        let stop_event = match accepted.motion {
            Some(Motion::Moving) => self.autostop.on_moving(fix.ts_ms),
            Some(Motion::Slow) => self.autostop.on_slow(fix.ts_ms, fix.lat, fix.lon),
            None => None,
        };

        let mut events = vec![EngineEvent::TrackPointCreated(accepted.point)];
        if let Some(e) = stop_event {
            if matches!(e, StopEvent::Opened(_)) {
                self.counters.stop_opened();
            }
            events.push(e.into());
        }
        events
    }

    /// Dekod én BLE-notifikasjon. Ugyldige/korte payloads gir ingen hendelser.
    pub fn ingest_sensor_notification(
        &mut self,
        source_id: &str,
        kind: CharacteristicKind,
        payload: &[u8],
        ts_ms: i64,
    ) -> Vec<EngineEvent> {
        let sensor = kind.sensor_type();
        match self.sensors.handle(source_id, kind, payload, ts_ms) {
            Some(reading) => {
                self.counters.sensor_reading(sensor);
                vec![EngineEvent::SensorReadingProduced(reading)]
            }
            None => {
                debug!("{} fra {}: ingen verdi ({} bytes)", sensor, source_id, payload.len());
                self.counters.sensor_dropped(sensor);
                Vec::new()
            }
        }
    }

    pub fn disconnect_sensor(&mut self, source_id: &str) {
        self.sensors.disconnect(source_id);
    }

    pub fn disconnect_all_sensors(&mut self) {
        self.sensors.disconnect_all();
    }

    pub fn has_cadence_state(&self, source_id: &str) -> bool {
        self.sensors.has_cadence_state(source_id)
    }
}

/// Trådsikker innpakning når fixes og BLE-notifikasjoner leveres fra
/// uavhengige kilder. Hver hendelse kjøres under låsen som én enhet.
#[derive(Debug, Clone)]
pub struct SharedRideEngine {
    inner: Arc<Mutex<RideEngine>>,
}

impl SharedRideEngine {
    pub fn new(engine: RideEngine) -> Self {
        Self { inner: Arc::new(Mutex::new(engine)) }
    }

    /// Kjør `f` med eksklusiv tilgang.
    pub fn with<R>(&self, f: impl FnOnce(&mut RideEngine) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut *guard)
    }

    pub fn ingest_fix(&self, fix: &PositionFix) -> Vec<EngineEvent> {
        self.with(|e| e.ingest_fix(fix))
    }

    pub fn ingest_sensor_notification(
        &self,
        source_id: &str,
        kind: CharacteristicKind,
        payload: &[u8],
        ts_ms: i64,
    ) -> Vec<EngineEvent> {
        self.with(|e| e.ingest_sensor_notification(source_id, kind, payload, ts_ms))
    }

    pub fn metrics(&self) -> RideMetrics {
        self.with(|e| e.metrics().clone())
    }

    pub fn state(&self) -> TrackingState {
        self.with(|e| e.state())
    }
}
