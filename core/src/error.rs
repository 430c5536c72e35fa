use thiserror::Error;

use crate::models::TrackingState;
use crate::session::SessionAction;

/// Kontrollkall i feil tilstand. Tilstanden er uendret når denne returneres.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} while {from}")]
    InvalidTransition { from: TrackingState, action: SessionAction },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("config serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Lagring og lesing av sluttførte turer.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("summary io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("summary parse error at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("summary serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("metrics registry: {0}")]
    Metrics(#[from] prometheus::Error),
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("line {line}: parse error at {path}: {message}")]
    Parse { line: usize, path: String, message: String },
    #[error("line {line}: invalid hex payload `{payload}`")]
    Hex { line: usize, payload: String },
    #[error("replay io error: {0}")]
    Io(#[from] std::io::Error),
}
