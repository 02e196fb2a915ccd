use std::fmt;

/// Unified error type for the tablio crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid input provided by the caller.
    InvalidInput(String),
    /// A referenced tab, window or group does not exist.
    NotFound(String),
    /// The browser rejected a command or could not be reached.
    Browser(String),
    /// Internal error.
    Internal(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            CoreError::NotFound(msg) => write!(f, "not found: {msg}"),
            CoreError::Browser(msg) => write!(f, "browser error: {msg}"),
            CoreError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;
