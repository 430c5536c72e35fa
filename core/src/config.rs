use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// Standardterskler for sporingsmotoren
pub const MAX_ACCEPTED_ACCURACY_M: f64 = 30.0;
pub const MAX_SEGMENT_JUMP_M: f64 = 80.0; // meter innenfor jump-vinduet
pub const JUMP_WINDOW_S: f64 = 2.0;
pub const MAX_SPEED_MPS: f64 = 20.0; // 72 km/h
pub const MOVING_SPEED_MPS: f64 = 1.0; // 3.6 km/h
pub const ELEVATION_NOISE_M: f64 = 2.0;
pub const AUTO_STOP_DELAY_MS: i64 = 15_000;
pub const MAX_CADENCE_RPM: f64 = 250.0;

/// Alle terskler som filteret, auto-stopp og BLE-dekoderen bruker.
/// Felter som mangler i JSON faller tilbake til standardverdiene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_accuracy_m: f64,
    pub max_jump_m: f64,
    pub jump_window_s: f64,
    pub max_speed_mps: f64,
    pub moving_speed_mps: f64,
    pub elevation_noise_m: f64,
    pub auto_stop_delay_ms: i64,
    pub max_cadence_rpm: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_accuracy_m: MAX_ACCEPTED_ACCURACY_M,
            max_jump_m: MAX_SEGMENT_JUMP_M,
            jump_window_s: JUMP_WINDOW_S,
            max_speed_mps: MAX_SPEED_MPS,
            moving_speed_mps: MOVING_SPEED_MPS,
            elevation_noise_m: ELEVATION_NOISE_M,
            auto_stop_delay_ms: AUTO_STOP_DELAY_MS,
            max_cadence_rpm: MAX_CADENCE_RPM,
        }
    }
}

fn positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason: format!("must be a positive finite number, got {v}") })
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_accuracy_m", self.max_accuracy_m)?;
        positive("max_jump_m", self.max_jump_m)?;
        positive("jump_window_s", self.jump_window_s)?;
        positive("max_speed_mps", self.max_speed_mps)?;
        positive("moving_speed_mps", self.moving_speed_mps)?;
        positive("max_cadence_rpm", self.max_cadence_rpm)?;

        // 0 m støygrense er lov (all høydeendring telles)
        if !self.elevation_noise_m.is_finite() || self.elevation_noise_m < 0.0 {
            return Err(ConfigError::Invalid {
                field: "elevation_noise_m",
                reason: format!("must be >= 0, got {}", self.elevation_noise_m),
            });
        }
        if self.auto_stop_delay_ms <= 0 {
            return Err(ConfigError::Invalid {
                field: "auto_stop_delay_ms",
                reason: format!("must be > 0, got {}", self.auto_stop_delay_ms),
            });
        }
        if self.moving_speed_mps >= self.max_speed_mps {
            return Err(ConfigError::Invalid {
                field: "moving_speed_mps",
                reason: "must be below max_speed_mps".into(),
            });
        }
        Ok(())
    }
}
