//! Error types for capture operations.

use std::fmt;

/// Error type for capture operations.
#[derive(Debug)]
pub enum CaptureError {
    /// No display matched the requested target
    TargetNotFound(String),
    /// The platform capture call failed
    PlatformError(String),
    /// The captured buffer does not match its reported dimensions
    InvalidFrame(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::TargetNotFound(msg) => write!(f, "Capture target not found: {}", msg),
            CaptureError::PlatformError(msg) => write!(f, "Platform error: {}", msg),
            CaptureError::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<CaptureError> for String {
    fn from(err: CaptureError) -> Self {
        err.to_string()
    }
}
