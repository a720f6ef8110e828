//! Error types for control system operations.

use thiserror::Error;
use tl_core::CoreError;

/// Result type for control system operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in control system operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Numeric guard failure (non-finite input, value out of range).
    #[error(transparent)]
    Core(#[from] CoreError),
}
