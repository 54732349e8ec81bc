//! Screen capture.
//!
//! The capture loop only sees the [`FrameSource`] trait; [`DisplaySource`]
//! is the real implementation backed by `xcap`.

pub mod display;
pub mod error;
pub mod types;

pub use display::{list_displays, DisplaySource};
pub use error::CaptureError;
pub use types::{ColorBuffer, Frame, BGRA_CHANNELS, BGR_CHANNELS};

/// Produces one still image of the capture target per call.
pub trait FrameSource {
    /// Grab the current contents of the target as a BGRA frame.
    fn capture(&mut self) -> Result<Frame, CaptureError>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        (**self).capture()
    }
}
