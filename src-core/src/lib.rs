//! Screen recording core.
//!
//! Captures the primary display on a timer, shows each frame on a preview
//! surface and, while recording, converts frames to BGR and pipes them into
//! an FFmpeg encoder.
//!
//! ```no_run
//! use screenrec_core::capture::DisplaySource;
//! use screenrec_core::encoder::FfmpegBackend;
//! use screenrec_core::preview::NoPreview;
//! use screenrec_core::session::{CaptureLoop, SessionConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = CaptureLoop::new(
//!     DisplaySource::primary()?,
//!     FfmpegBackend::new(),
//!     NoPreview,
//!     SessionConfig::default(),
//! );
//! session.start(Some("screen.mp4".into()));
//! session.run(tokio::time::sleep(std::time::Duration::from_secs(5))).await?;
//! session.close();
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod config;
pub mod convert;
pub mod encoder;
pub mod preview;
pub mod session;

pub use screenrec_types as types;
