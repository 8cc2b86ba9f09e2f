//! Camera Error Types

#[derive(Debug, Clone, thiserror::Error)]
pub enum CameraError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("No capture device available")]
    NoDevice,

    #[error("Capture device busy (held by handle {holder})")]
    DeviceBusy { holder: u64 },

    #[error("Capture backend error: {reason}")]
    Backend { reason: String },

    #[error("Capture stream has ended")]
    StreamEnded,
}

impl crate::core::error_handling::ContextualError for CameraError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            CameraError::PermissionDenied | CameraError::NoDevice | CameraError::DeviceBusy { .. }
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            CameraError::PermissionDenied => {
                Some("Camera access was denied; allow camera access and try again")
            }
            CameraError::NoDevice => Some("No camera was found; connect a camera and try again"),
            CameraError::DeviceBusy { .. } => {
                Some("The camera is in use by another scan; cancel it first")
            }
            _ => None,
        }
    }
}

/// Result type for camera operations
pub type CameraResult<T> = Result<T, CameraError>;
