//! Product Lookup Error Types

#[derive(Debug, Clone, thiserror::Error)]
pub enum LookupError {
    #[error("Lookup request failed: {reason}")]
    Http { reason: String },

    #[error("Lookup service returned status {status}")]
    Status { status: u16 },

    #[error("Lookup response could not be decoded: {reason}")]
    Decode { reason: String },

    #[error("Lookup is not configured: {reason}")]
    Configuration { reason: String },

    #[error("Lookup internal error: {reason}")]
    Internal { reason: String },
}

impl LookupError {
    /// Worth retrying: transport failures, rate limiting and server errors
    pub fn is_transient(&self) -> bool {
        match self {
            LookupError::Http { .. } => true,
            LookupError::Status { status } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl crate::core::error_handling::ContextualError for LookupError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, LookupError::Configuration { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            LookupError::Configuration { reason } => Some(reason),
            _ => None,
        }
    }
}

pub type LookupResult<T> = Result<T, LookupError>;
