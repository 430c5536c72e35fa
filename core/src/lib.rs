pub mod autostop;
pub mod ble;
pub mod cli;
pub mod config;
pub mod counters;
pub mod engine;
pub mod error;
pub mod filter;
pub mod format;
pub mod geo;
pub mod models;
pub mod replay;
pub mod session;
pub mod storage;

#[cfg(feature = "python")]
mod py;

pub use autostop::{AutoStopDetector, StopEvent};
pub use ble::{decode_heart_rate, decode_power, CadenceDecoder, CharacteristicKind, SensorHub};
pub use config::EngineConfig;
pub use counters::Counters;
pub use engine::{EngineEvent, RideEngine, SharedRideEngine};
pub use error::{ConfigError, EngineError, ReplayError, SessionError, SummaryError};
pub use filter::{FixOutcome, MetricsAccumulator, Motion, RejectReason};
pub use geo::distance_m;
pub use models::{
    PositionFix, RideMetrics, RideStatus, RideSummary, SensorReading, SensorType, Stop, TrackPoint,
    TrackingState,
};
pub use session::{SessionAction, SessionStateMachine, Transition};
pub use storage::{load_config, load_summary, save_config, save_summary};
