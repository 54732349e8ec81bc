//! Video encoding.
//!
//! [`EncoderBackend`] opens an output file for a fixed geometry and returns a
//! [`FrameSink`] that accepts BGR frames of exactly that geometry. The FFmpeg
//! implementation lives in [`ffmpeg`].

pub mod ffmpeg;

use crate::capture::ColorBuffer;
use screenrec_types::{Codec, FrameRate, Geometry};
use std::fmt;
use std::path::PathBuf;

pub use ffmpeg::{ensure_ffmpeg, FfmpegBackend, FfmpegSink};

/// Error type for encoder operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderError {
    /// The encoder could not be initialized for the target
    CannotOpen(String),
    /// Writing a frame to the encoder failed
    WriteFailed(String),
    /// A frame did not match the geometry the encoder was opened with
    GeometryMismatch { expected: Geometry, actual: Geometry },
}

impl fmt::Display for EncoderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncoderError::CannotOpen(msg) => write!(f, "Cannot open encoder: {}", msg),
            EncoderError::WriteFailed(msg) => write!(f, "Failed to write frame: {}", msg),
            EncoderError::GeometryMismatch { expected, actual } => write!(
                f,
                "Frame is {} but the encoder was opened for {}",
                actual, expected
            ),
        }
    }
}

impl std::error::Error for EncoderError {}

impl From<EncoderError> for String {
    fn from(err: EncoderError) -> Self {
        err.to_string()
    }
}

/// Everything needed to open an output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderTarget {
    pub path: PathBuf,
    pub geometry: Geometry,
    pub fps: FrameRate,
    pub codec: Codec,
}

impl EncoderTarget {
    /// Build a target, selecting the codec from the path's extension.
    pub fn new(path: impl Into<PathBuf>, geometry: Geometry, fps: FrameRate) -> Self {
        let path = path.into();
        let codec = Codec::from_path(&path);
        Self {
            path,
            geometry,
            fps,
            codec,
        }
    }
}

/// An open output file accepting frames of one fixed geometry.
pub trait FrameSink {
    /// Append one frame. The buffer must match the sink's geometry.
    fn write_frame(&mut self, buffer: &ColorBuffer) -> Result<(), EncoderError>;

    /// Flush and release the output. Calling it again is a no-op and
    /// failures are logged, never returned.
    fn close(&mut self);
}

/// Opens [`FrameSink`]s.
pub trait EncoderBackend {
    type Sink: FrameSink;

    fn open(&mut self, target: &EncoderTarget) -> Result<Self::Sink, EncoderError>;
}

/// Reject a buffer whose geometry differs from `expected`.
pub(crate) fn check_geometry(expected: Geometry, buffer: &ColorBuffer) -> Result<(), EncoderError> {
    let actual = buffer.geometry();
    if actual != expected {
        return Err(EncoderError::GeometryMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_selects_codec_from_extension() {
        let fps = FrameRate::new(20);
        let geometry = Geometry::new(960, 540);
        assert_eq!(EncoderTarget::new("a.mp4", geometry, fps).codec, Codec::Mp4v);
        assert_eq!(EncoderTarget::new("a.avi", geometry, fps).codec, Codec::Xvid);
        assert_eq!(EncoderTarget::new("a.webm", geometry, fps).codec, Codec::Xvid);
    }

    #[test]
    fn test_check_geometry() {
        let buffer = ColorBuffer {
            width: 2,
            height: 1,
            data: vec![0; 6],
        };
        assert!(check_geometry(Geometry::new(2, 1), &buffer).is_ok());
        assert_eq!(
            check_geometry(Geometry::new(4, 2), &buffer),
            Err(EncoderError::GeometryMismatch {
                expected: Geometry::new(4, 2),
                actual: Geometry::new(2, 1),
            })
        );
    }
}
