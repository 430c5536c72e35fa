use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json as json;
use serde_path_to_error as spte;

use crate::engine::{EngineEvent, RideEngine};
use crate::models::PositionFix;
use crate::replay::characteristic_from_str;
use crate::EngineConfig;

// ──────────────────────────────────────────────────────────────────────────────
// HJELPERE
// ──────────────────────────────────────────────────────────────────────────────

fn parse_json<T: DeserializeOwned>(what: &str, json_in: &str) -> PyResult<T> {
    let mut de = json::Deserializer::from_str(json_in);
    spte::deserialize(&mut de).map_err(|e| {
        let path = e.path().to_string();
        PyValueError::new_err(format!("parse error ({}) at {}: {}", what, path, e))
    })
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> PyResult<String> {
    json::to_string(value).map_err(|e| PyValueError::new_err(format!("serialize error: {e}")))
}

fn events_json(events: Vec<EngineEvent>) -> PyResult<String> {
    to_json(&events)
}

// ──────────────────────────────────────────────────────────────────────────────
// PyO3-KLASSE
// ──────────────────────────────────────────────────────────────────────────────

/// Python-innpakning av `RideEngine`. Hendelser returneres som JSON-strenger.
#[pyclass(name = "RideEngine")]
pub struct PyRideEngine {
    inner: RideEngine,
}

#[pymethods]
impl PyRideEngine {
    #[new]
    #[pyo3(signature = (config_json=None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let cfg: EngineConfig = match config_json {
            Some(s) => parse_json("EngineConfig", s)?,
            None => EngineConfig::default(),
        };
        let inner = RideEngine::new(cfg).map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(Self { inner })
    }

    fn start_session(&mut self, ride_id: i64, now_ms: i64) -> PyResult<String> {
        let ev = self
            .inner
            .start_session(ride_id, now_ms)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        events_json(ev)
    }

    fn pause_session(&mut self) -> PyResult<String> {
        let ev = self.inner.pause_session().map_err(|e| PyValueError::new_err(e.to_string()))?;
        events_json(ev)
    }

    fn resume_session(&mut self) -> PyResult<String> {
        let ev = self.inner.resume_session().map_err(|e| PyValueError::new_err(e.to_string()))?;
        events_json(ev)
    }

    fn stop_session(&mut self, now_ms: i64) -> PyResult<String> {
        let ev = self.inner.stop_session(now_ms).map_err(|e| PyValueError::new_err(e.to_string()))?;
        events_json(ev)
    }

    /// Fix som JSON: {"lat", "lon", "accuracy_m", "ts_ms", "altitude_m"?, "speed_mps"?}
    fn ingest_fix_json(&mut self, fix_json: &str) -> PyResult<String> {
        let fix: PositionFix = parse_json("PositionFix", fix_json)?;
        events_json(self.inner.ingest_fix(&fix))
    }

    fn ingest_sensor_notification(
        &mut self,
        source_id: &str,
        characteristic: &str,
        payload: &[u8],
        ts_ms: i64,
    ) -> PyResult<String> {
        let kind = characteristic_from_str(characteristic)
            .ok_or_else(|| PyValueError::new_err(format!("unknown characteristic: {characteristic}")))?;
        events_json(self.inner.ingest_sensor_notification(source_id, kind, payload, ts_ms))
    }

    #[pyo3(signature = (source_id=None))]
    fn disconnect_sensor(&mut self, source_id: Option<&str>) {
        match source_id {
            Some(id) => self.inner.disconnect_sensor(id),
            None => self.inner.disconnect_all_sensors(),
        }
    }

    fn metrics_json(&self) -> PyResult<String> {
        to_json(self.inner.metrics())
    }

    fn summary_json(&self) -> PyResult<Option<String>> {
        self.inner.summary().map(|s| to_json(&s)).transpose()
    }

    fn state(&self) -> String {
        self.inner.state().to_string()
    }

    fn prometheus_text(&self) -> PyResult<String> {
        self.inner.counters().gather_text().map_err(|e| PyValueError::new_err(e.to_string()))
    }
}

#[pyfunction]
fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    crate::geo::distance_m(lat1, lon1, lat2, lon2)
}

// ──────────────────────────────────────────────────────────────────────────────
// PyO3-MODUL
// ──────────────────────────────────────────────────────────────────────────────

#[pymodule]
fn trailride_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyRideEngine>()?;
    m.add_function(wrap_pyfunction!(haversine_m, m)?)?;
    Ok(())
}
