//! Decode Engine Error Types

use super::types::DecodeSource;

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("Decoder '{backend}' failed to initialise: {reason}")]
    Initialization { backend: String, reason: String },

    #[error("Decoder '{backend}' cannot decode {mode} input")]
    UnsupportedSource { backend: String, mode: DecodeSource },

    #[error("Decoder '{backend}' supports none of the enabled symbologies")]
    NoEnabledSymbology { backend: String },

    #[error("Frame decode failed: {reason}")]
    Frame { reason: String },

    #[error("Image decode failed: {reason}")]
    Still { reason: String },
}

impl crate::core::error_handling::ContextualError for EngineError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, EngineError::NoEnabledSymbology { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            EngineError::NoEnabledSymbology { .. } => {
                Some("The decoder supports none of the configured symbologies; check --symbology")
            }
            _ => None,
        }
    }
}

/// Result type for decode engine operations
pub type EngineResult<T> = Result<T, EngineError>;
