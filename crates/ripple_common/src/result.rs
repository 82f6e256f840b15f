//! Common result and error types for the Ripple build core.

/// The standard result type for operations that can only fail on a bug.
///
/// `Err` indicates a broken internal contract (for example a placeholder
/// lookup tracker passed where a recording one was required), never a user
/// input problem. Callers must abort the current pass when they see one.
pub type RippleResult<T> = Result<T, InternalError>;

/// An internal contract violation.
///
/// Raised immediately instead of degrading silently, since a silent skip in
/// the cache or lookup layers would leave stale artifacts unrecompiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the violated contract.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
