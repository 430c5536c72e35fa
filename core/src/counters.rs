use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::filter::RejectReason;
use crate::models::{SensorType, TrackingState};

/// Prometheus-tellere for én motor. Eget register per instans,
/// så parallelle økter (og tester) ikke kolliderer i det globale registeret.
#[derive(Clone)]
pub struct Counters {
    registry: Registry,
    fixes_accepted: IntCounter,
    fixes_rejected: IntCounterVec,
    sensor_readings: IntCounterVec,
    sensor_dropped: IntCounterVec,
    stops_opened: IntCounter,
    transitions: IntCounterVec,
}

impl Counters {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("trailride".into()), None)?;

        let fixes_accepted = IntCounter::new("fixes_accepted_total", "Accepted position fixes")?;
        let fixes_rejected = IntCounterVec::new(
            Opts::new("fixes_rejected_total", "Rejected position fixes by rule"),
            &["reason"],
        )?;
        let sensor_readings = IntCounterVec::new(
            Opts::new("sensor_readings_total", "Decoded sensor readings"),
            &["sensor"],
        )?;
        let sensor_dropped = IntCounterVec::new(
            Opts::new("sensor_payloads_dropped_total", "Sensor notifications that produced no reading"),
            &["sensor"],
        )?;
        let stops_opened = IntCounter::new("stops_opened_total", "Auto-detected stops")?;
        let transitions = IntCounterVec::new(
            Opts::new("session_transitions_total", "Session state transitions by target state"),
            &["to"],
        )?;

        registry.register(Box::new(fixes_accepted.clone()))?;
        registry.register(Box::new(fixes_rejected.clone()))?;
        registry.register(Box::new(sensor_readings.clone()))?;
        registry.register(Box::new(sensor_dropped.clone()))?;
        registry.register(Box::new(stops_opened.clone()))?;
        registry.register(Box::new(transitions.clone()))?;

        Ok(Self {
            registry,
            fixes_accepted,
            fixes_rejected,
            sensor_readings,
            sensor_dropped,
            stops_opened,
            transitions,
        })
    }

    pub fn fix_accepted(&self) {
        self.fixes_accepted.inc();
    }

    pub fn fix_rejected(&self, reason: RejectReason) {
        self.fixes_rejected.with_label_values(&[reason.as_str()]).inc();
    }

    pub fn sensor_reading(&self, sensor: SensorType) {
        self.sensor_readings.with_label_values(&[sensor.as_str()]).inc();
    }

    pub fn sensor_dropped(&self, sensor: SensorType) {
        self.sensor_dropped.with_label_values(&[sensor.as_str()]).inc();
    }

    pub fn stop_opened(&self) {
        self.stops_opened.inc();
    }

    pub fn transition(&self, to: TrackingState) {
        let to = to.to_string();
        self.transitions.with_label_values(&[to.as_str()]).inc();
    }

    pub fn accepted_count(&self) -> u64 {
        self.fixes_accepted.get()
    }

    pub fn rejected_count(&self, reason: RejectReason) -> u64 {
        self.fixes_rejected.with_label_values(&[reason.as_str()]).get()
    }

    pub fn stops_opened_count(&self) -> u64 {
        self.stops_opened.get()
    }

    /// Prometheus tekstformat.
    pub fn gather_text(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(format!("metrics not utf-8: {e}")))
    }
}

impl std::fmt::Debug for Counters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Counters")
            .field("fixes_accepted", &self.fixes_accepted.get())
            .field("stops_opened", &self.stops_opened.get())
            .finish()
    }
}
