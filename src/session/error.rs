//! Session Error Types
//!
//! `ScanFailure` is the reason carried by a Failed session. `SessionError` is returned
//! directly by controller calls that are rejected without touching the session.

use std::time::Duration;

use super::types::ScanMode;
use crate::camera::CameraError;
use crate::decoder::EngineError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanFailure {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Capture device unavailable: {reason}")]
    DeviceUnavailable { reason: String },

    #[error("Decode engine error: {reason}")]
    DecodeEngineError { reason: String },

    #[error("No code found in the image")]
    NoCodeFound,

    #[error("No code found within {}ms", timeout.as_millis())]
    ScanTimeout { timeout: Duration },
}

impl ScanFailure {
    /// Stable name for machine-readable output
    pub fn kind(&self) -> &'static str {
        match self {
            ScanFailure::PermissionDenied => "PermissionDenied",
            ScanFailure::DeviceUnavailable { .. } => "DeviceUnavailable",
            ScanFailure::DecodeEngineError { .. } => "DecodeEngineError",
            ScanFailure::NoCodeFound => "NoCodeFound",
            ScanFailure::ScanTimeout { .. } => "ScanTimeout",
        }
    }
}

impl From<CameraError> for ScanFailure {
    fn from(error: CameraError) -> Self {
        match error {
            CameraError::PermissionDenied => ScanFailure::PermissionDenied,
            other => ScanFailure::DeviceUnavailable {
                reason: other.to_string(),
            },
        }
    }
}

impl From<EngineError> for ScanFailure {
    fn from(error: EngineError) -> Self {
        ScanFailure::DecodeEngineError {
            reason: error.to_string(),
        }
    }
}

impl crate::core::error_handling::ContextualError for ScanFailure {
    fn is_user_actionable(&self) -> bool {
        !matches!(self, ScanFailure::DecodeEngineError { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ScanFailure::PermissionDenied => {
                Some("Camera access was denied; allow camera access and try again")
            }
            ScanFailure::DeviceUnavailable { .. } => {
                Some("No usable camera; check the camera is connected and not in use")
            }
            ScanFailure::NoCodeFound => {
                Some("No barcode was found in the image; try a sharper, closer photo")
            }
            ScanFailure::ScanTimeout { .. } => {
                Some("No barcode was recognised in time; move closer or improve the lighting")
            }
            ScanFailure::DecodeEngineError { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("Zoom level {level} is outside 1.0-5.0")]
    InvalidZoom { level: f64 },

    #[error("{operation} is not available in {mode} mode")]
    WrongMode {
        operation: &'static str,
        mode: ScanMode,
    },

    #[error("An image was already submitted to this session")]
    ImageAlreadySubmitted,

    #[error("The session has already finished")]
    SessionClosed,

    #[error("No scan session is running")]
    NoActiveSession,

    #[error("Invalid session options: {reason}")]
    InvalidOptions { reason: String },
}

impl crate::core::error_handling::ContextualError for SessionError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidZoom { .. } | SessionError::InvalidOptions { .. }
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            SessionError::InvalidZoom { .. } => Some("Zoom must be between 1.0 and 5.0"),
            SessionError::InvalidOptions { reason } => Some(reason),
            _ => None,
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_errors_map_to_failures() {
        assert_eq!(
            ScanFailure::from(CameraError::PermissionDenied),
            ScanFailure::PermissionDenied
        );
        assert!(matches!(
            ScanFailure::from(CameraError::DeviceBusy { holder: 3 }),
            ScanFailure::DeviceUnavailable { reason } if reason.contains("busy")
        ));
        assert_eq!(ScanFailure::from(CameraError::NoDevice).kind(), "DeviceUnavailable");
    }

    #[test]
    fn test_timeout_message() {
        let failure = ScanFailure::ScanTimeout {
            timeout: Duration::from_millis(5000),
        };
        assert_eq!(failure.to_string(), "No code found within 5000ms");
    }

    #[test]
    fn test_wrong_mode_message() {
        let error = SessionError::WrongMode {
            operation: "set_zoom",
            mode: ScanMode::StillImage,
        };
        assert_eq!(error.to_string(), "set_zoom is not available in still-image mode");
    }
}
