//! Result Sink Error Types

#[derive(Debug, Clone, thiserror::Error)]
pub enum SinkError {
    #[error("Item workflow rejected code {code}: {reason}")]
    Workflow { code: String, reason: String },

    #[error("Item workflow is no longer listening")]
    ChannelClosed,
}

impl crate::core::error_handling::ContextualError for SinkError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

pub type SinkResult<T> = Result<T, SinkError>;
