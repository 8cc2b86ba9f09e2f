//! Session data types

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::error::ScanFailure;
use crate::decoder::{DecodeResult, DecodeSource, Symbology};

/// How a session acquires its code
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMode {
    /// Continuous decoding of a camera feed
    #[default]
    #[strum(to_string = "live-stream", serialize = "live")]
    LiveStream,
    /// One submitted image
    #[strum(to_string = "still-image", serialize = "still")]
    StillImage,
    /// A synthesised code after a fixed delay; no camera, no decoder
    #[strum(to_string = "simulated", serialize = "simulate")]
    Simulated,
}

impl ScanMode {
    pub fn requires_camera(self) -> bool {
        matches!(self, ScanMode::LiveStream)
    }

    /// Decoder input used by this mode, if it decodes at all
    pub fn decode_source(self) -> Option<DecodeSource> {
        match self {
            ScanMode::LiveStream => Some(DecodeSource::Frame),
            ScanMode::StillImage => Some(DecodeSource::Still),
            ScanMode::Simulated => None,
        }
    }
}

/// One tagged state per session in place of separate busy/error flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Initializing,
    Active,
    Decoding,
    Succeeded,
    Failed,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Succeeded | SessionState::Failed | SessionState::Cancelled
        )
    }

    /// States in which a live session may hold a capture handle
    pub fn may_hold_device(self) -> bool {
        matches!(
            self,
            SessionState::Initializing | SessionState::Active | SessionState::Decoding
        )
    }
}

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 5.0;
pub const DEFAULT_SIMULATION_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOptions {
    pub delay: Duration,
    pub symbology: Symbology,
    /// Fixed seed for reproducible codes
    pub seed: Option<u64>,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            delay: DEFAULT_SIMULATION_DELAY,
            symbology: Symbology::Ean13,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOptions {
    /// Initial zoom for live sessions, 1.0 to 5.0
    pub zoom_level: Option<f64>,
    /// Give up with `ScanTimeout` when no code is found in time
    pub timeout: Option<Duration>,
    pub simulation: SimulationOptions,
}

impl SessionOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_zoom(mut self, zoom_level: f64) -> Self {
        self.zoom_level = Some(zoom_level);
        self
    }

    pub fn with_simulation(mut self, simulation: SimulationOptions) -> Self {
        self.simulation = simulation;
        self
    }
}

/// Terminal result of a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Succeeded(DecodeResult),
    Failed(ScanFailure),
    Cancelled,
}

impl SessionOutcome {
    pub fn state(&self) -> SessionState {
        match self {
            SessionOutcome::Succeeded(_) => SessionState::Succeeded,
            SessionOutcome::Failed(_) => SessionState::Failed,
            SessionOutcome::Cancelled => SessionState::Cancelled,
        }
    }

    pub fn result(&self) -> Option<&DecodeResult> {
        match self {
            SessionOutcome::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ScanFailure> {
        match self {
            SessionOutcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// What the session task publishes to its handles
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub state: SessionState,
    pub outcome: Option<SessionOutcome>,
    pub zoom_level: Option<f64>,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            outcome: None,
            zoom_level: None,
        }
    }
}

/// Point-in-time view of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSession {
    pub id: String,
    pub mode: ScanMode,
    pub state: SessionState,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom_level: Option<f64>,
}
