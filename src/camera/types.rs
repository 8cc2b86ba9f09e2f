//! Capture constraint and frame types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Which way the requested camera faces
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera, pointed at the product
    #[default]
    Environment,
    /// Front camera
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Zoom levels a device reports it can honour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
}

impl ZoomRange {
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn clamp(&self, level: f64) -> f64 {
        level.clamp(self.min, self.max)
    }
}

/// What the caller asks of a capture device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    pub facing: FacingMode,
    pub resolution: Resolution,
    /// Initial zoom applied after acquisition when the session gives none
    pub zoom: f64,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            resolution: Resolution::default(),
            zoom: 1.0,
        }
    }
}

/// A device as enumerated by a capture backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    pub label: String,
    pub facing: FacingMode,
}

impl DeviceInfo {
    pub fn new(id: impl Into<String>, label: impl Into<String>, facing: FacingMode) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            facing,
        }
    }
}

/// One frame from a capture stream
#[derive(Debug, Clone)]
pub struct Frame {
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

/// Result of a best-effort zoom request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomOutcome {
    /// Zoom set to this level, after clamping to the device range
    Applied(f64),
    /// The device has no zoom control; nothing was changed
    Unsupported,
}
