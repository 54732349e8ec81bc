//! Shared types for screenrec.
//!
//! Plain value types used by both the recording core and the CLI, plus
//! log-directory resolution.

pub mod logging;
pub mod types;

pub use types::{
    AspectMode, Codec, DisplayInfo, FrameRate, Geometry, RecordingState, ScaleFactor,
};
