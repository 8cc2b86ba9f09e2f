//! Error reporting shared by every listscan error type
//!
//! Errors raised at the edges (bad options, denied camera permission, unreadable
//! config) are worth showing to the user verbatim. Everything else is reported with a
//! short context line and the detail goes to the debug log.

/// Errors that know whether their message is meant for the user
///
/// When `is_user_actionable()` is `true`, `user_message()` must return `Some`.
pub trait ContextualError: std::error::Error {
    /// True when the message tells the user what to fix (grant permission,
    /// correct an option, plug in a camera)
    fn is_user_actionable(&self) -> bool;

    /// The message to show when the error is user-actionable
    fn user_message(&self) -> Option<&str>;
}

/// Log a fatal error at the right level of detail
///
/// User-actionable errors log their own message; other errors log `operation_context`
/// and leave the detail to the debug level.
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message().filter(|_| error.is_user_actionable()) {
        Some(user_msg) => log::error!("FATAL: {}", user_msg),
        None => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

/// Headline for an error as shown on the terminal
pub fn headline<E: ContextualError + std::fmt::Display>(error: &E, operation_context: &str) -> String {
    match error.user_message().filter(|_| error.is_user_actionable()) {
        Some(user_msg) => user_msg.to_string(),
        None => format!("{}: {}", operation_context, error),
    }
}
