use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SessionError;
use crate::models::TrackingState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    Start,
    Pause,
    Resume,
    Stop,
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionAction::Start => "start",
            SessionAction::Pause => "pause",
            SessionAction::Resume => "resume",
            SessionAction::Stop => "stop",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: TrackingState,
    pub to: TrackingState,
}

/// Idle → Tracking → {Paused ⇄ Tracking} → Idle.
#[derive(Debug, Clone, Default)]
pub struct SessionStateMachine {
    state: TrackingState,
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn accepts_fixes(&self) -> bool {
        self.state == TrackingState::Tracking
    }

    /// Målstatus for `action` fra `from`, eller `None` hvis overgangen er ugyldig.
    pub fn target(from: TrackingState, action: SessionAction) -> Option<TrackingState> {
        use SessionAction::*;
        use TrackingState::*;
        match (from, action) {
            (Idle, Start) => Some(Tracking),
            (Tracking, Pause) => Some(Paused),
            (Paused, Resume) => Some(Tracking),
            (Tracking, Stop) | (Paused, Stop) => Some(Idle),
            _ => None,
        }
    }

    pub fn apply(&mut self, action: SessionAction) -> Result<Transition, SessionError> {
        let from = self.state;
        let Some(to) = Self::target(from, action) else {
            warn!("ugyldig overgang: {} i tilstand {}", action, from);
            return Err(SessionError::InvalidTransition { from, action });
        };
        self.state = to;
        info!("økt: {} -> {} ({})", from, to, action);
        Ok(Transition { from, to })
    }
}
