//! Recording session: the capture loop and its state machine.
//!
//! A [`CaptureLoop`] owns a frame source, an encoder backend and a preview
//! surface. Every tick it captures one frame and presents it; while
//! recording it also converts the frame and writes it to the encoder, which
//! is opened on the first recorded frame so the output geometry is known.
//!
//! All work for a tick happens synchronously inside [`CaptureLoop::tick`], so
//! ticks never overlap. When a tick overruns its interval later ticks are
//! delayed rather than dropped.

#[cfg(test)]
mod testing;

use crate::capture::{CaptureError, Frame, FrameSource};
use crate::config::RecordingConfig;
use crate::convert::PixelConverter;
use crate::encoder::{EncoderBackend, EncoderError, EncoderTarget, FrameSink};
use crate::preview::PreviewSurface;
use screenrec_types::{AspectMode, Codec, FrameRate, Geometry, RecordingState, ScaleFactor};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Consecutive failed captures after which the loop gives up.
pub const MAX_CONSECUTIVE_CAPTURE_FAILURES: u32 = 30;

/// Error that ends a session.
#[derive(Debug)]
pub enum SessionError {
    /// The encoder could not be opened or written to
    Encoder(EncoderError),
    /// The display could not be captured repeatedly
    Capture(CaptureError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Encoder(e) => write!(f, "{}", e),
            SessionError::Capture(e) => write!(f, "Capture failed: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Encoder(e) => Some(e),
            SessionError::Capture(e) => Some(e),
        }
    }
}

impl From<EncoderError> for SessionError {
    fn from(err: EncoderError) -> Self {
        SessionError::Encoder(err)
    }
}

impl From<CaptureError> for SessionError {
    fn from(err: CaptureError) -> Self {
        SessionError::Capture(err)
    }
}

impl From<SessionError> for String {
    fn from(err: SessionError) -> Self {
        err.to_string()
    }
}

/// Settings a session runs with. Only changeable while idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionConfig {
    pub fps: FrameRate,
    pub scale: ScaleFactor,
    pub aspect: AspectMode,
}

impl From<&RecordingConfig> for SessionConfig {
    fn from(config: &RecordingConfig) -> Self {
        Self {
            fps: config.fps,
            scale: config.scale,
            aspect: config.aspect(),
        }
    }
}

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Now recording
    Started,
    /// No output path was chosen; still idle
    Cancelled,
    /// A recording is already in progress; nothing changed
    AlreadyRecording,
}

/// What a finished recording produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSummary {
    pub output: PathBuf,
    pub codec: Codec,
    /// Frame geometry of the file, `None` if no frame was written
    pub geometry: Option<Geometry>,
    pub frames_written: u64,
    pub duration: Duration,
}

struct ActiveEncoder<S> {
    target: EncoderTarget,
    sink: S,
    frames_written: u64,
}

enum SessionState<S> {
    Idle,
    Recording {
        output: PathBuf,
        started: Instant,
        /// Opened lazily on the first recorded frame
        encoder: Option<ActiveEncoder<S>>,
    },
}

/// Timer-driven capture, preview and record loop.
pub struct CaptureLoop<F, B, P>
where
    F: FrameSource,
    B: EncoderBackend,
    P: PreviewSurface,
{
    source: F,
    backend: B,
    preview: P,
    converter: PixelConverter,
    config: SessionConfig,
    state: SessionState<B::Sink>,
    capture_failures: u32,
    ticks: u64,
    last_summary: Option<RecordingSummary>,
}

impl<F, B, P> CaptureLoop<F, B, P>
where
    F: FrameSource,
    B: EncoderBackend,
    P: PreviewSurface,
{
    pub fn new(source: F, backend: B, preview: P, config: SessionConfig) -> Self {
        Self {
            source,
            backend,
            preview,
            converter: PixelConverter::new(),
            config,
            state: SessionState::Idle,
            capture_failures: 0,
            ticks: 0,
            last_summary: None,
        }
    }

    /// Replace the session settings. Rejected while recording.
    pub fn set_config(&mut self, config: SessionConfig) -> Result<(), String> {
        if self.is_recording() {
            return Err("Cannot change settings while recording".to_string());
        }
        self.config = config;
        Ok(())
    }

    pub fn state(&self) -> RecordingState {
        match self.state {
            SessionState::Idle => RecordingState::Idle,
            SessionState::Recording { .. } => RecordingState::Recording,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, SessionState::Recording { .. })
    }

    /// Time between ticks: `1000ms / fps`.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.config.fps.interval_ms())
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn output_path(&self) -> Option<&Path> {
        match &self.state {
            SessionState::Recording { output, .. } => Some(output),
            SessionState::Idle => None,
        }
    }

    /// Geometry fixed by the first recorded frame, if any.
    pub fn geometry(&self) -> Option<Geometry> {
        match &self.state {
            SessionState::Recording {
                encoder: Some(active),
                ..
            } => Some(active.target.geometry),
            _ => None,
        }
    }

    /// Summary of the most recently stopped recording.
    pub fn last_summary(&self) -> Option<&RecordingSummary> {
        self.last_summary.as_ref()
    }

    /// Begin recording to `output`.
    ///
    /// A missing or empty path means the user cancelled and leaves the loop idle.
    pub fn start(&mut self, output: Option<PathBuf>) -> StartOutcome {
        if self.is_recording() {
            return StartOutcome::AlreadyRecording;
        }
        let Some(output) = output.filter(|p| !p.as_os_str().is_empty()) else {
            debug!("Start cancelled: no output path");
            return StartOutcome::Cancelled;
        };

        info!(
            "Recording to {} at {}, scale {}",
            output.display(),
            self.config.fps,
            self.config.scale
        );
        self.capture_failures = 0;
        self.state = SessionState::Recording {
            output,
            started: Instant::now(),
            encoder: None,
        };
        StartOutcome::Started
    }

    /// Close the encoder and return to idle. Does nothing while idle.
    pub fn stop(&mut self) -> Option<RecordingSummary> {
        let SessionState::Recording {
            output,
            started,
            encoder,
        } = std::mem::replace(&mut self.state, SessionState::Idle)
        else {
            return None;
        };

        let (geometry, frames_written) = match encoder {
            Some(mut active) => {
                active.sink.close();
                (Some(active.target.geometry), active.frames_written)
            }
            None => (None, 0),
        };

        let summary = RecordingSummary {
            codec: Codec::from_path(&output),
            output,
            geometry,
            frames_written,
            duration: started.elapsed(),
        };
        info!(
            "Recording stopped: {} ({} frames)",
            summary.output.display(),
            summary.frames_written
        );
        self.last_summary = Some(summary.clone());
        Some(summary)
    }

    /// Handle the application closing: stop any recording first.
    pub fn close(&mut self) -> Option<RecordingSummary> {
        if self.is_recording() {
            info!("Closing while recording, stopping first");
        }
        self.stop()
    }

    /// Run one capture/preview/record cycle.
    pub fn tick(&mut self) -> Result<(), SessionError> {
        self.ticks += 1;

        let frame = match self.source.capture() {
            Ok(frame) => {
                self.capture_failures = 0;
                frame
            }
            Err(e) => {
                self.capture_failures += 1;
                if self.capture_failures >= MAX_CONSECUTIVE_CAPTURE_FAILURES {
                    error!("Giving up after {} failed captures: {}", self.capture_failures, e);
                    self.stop();
                    return Err(SessionError::Capture(e));
                }
                warn!("Skipping tick {}: {}", self.ticks, e);
                return Ok(());
            }
        };

        if let Err(e) = self.preview.present(&frame, self.config.aspect) {
            debug!("{}", e);
        }

        if let Err(e) = self.record(&frame) {
            error!("Aborting recording: {}", e);
            self.stop();
            return Err(e);
        }
        Ok(())
    }

    fn record(&mut self, frame: &Frame) -> Result<(), SessionError> {
        let SessionState::Recording {
            output, encoder, ..
        } = &mut self.state
        else {
            return Ok(());
        };

        let buffer = self.converter.convert(frame, self.config.scale)?;

        if encoder.is_none() {
            let target = EncoderTarget::new(output.clone(), buffer.geometry(), self.config.fps);
            let sink = self.backend.open(&target)?;
            *encoder = Some(ActiveEncoder {
                target,
                sink,
                frames_written: 0,
            });
        }
        let Some(active) = encoder.as_mut() else {
            return Ok(());
        };

        let geometry = active.target.geometry;
        let buffer = if buffer.geometry() == geometry {
            buffer
        } else {
            debug!("Resizing {} frame to {}", buffer.geometry(), geometry);
            self.converter.resize(buffer, geometry)?
        };

        match active.sink.write_frame(&buffer) {
            Ok(()) => {}
            // An encoder that dies before taking its first frame never opened
            Err(EncoderError::WriteFailed(msg)) if active.frames_written == 0 => {
                return Err(EncoderError::CannotOpen(format!(
                    "encoder rejected the first frame: {}",
                    msg
                ))
                .into());
            }
            Err(e) => return Err(e.into()),
        }
        active.frames_written += 1;
        Ok(())
    }

    /// Tick every `1000ms / fps` until `shutdown` resolves or a tick fails.
    ///
    /// Does not stop the recording on shutdown; call [`close`](Self::close) afterwards.
    pub async fn run<S>(&mut self, shutdown: S) -> Result<(), SessionError>
    where
        S: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    debug!("Capture loop shutting down after {} ticks", self.ticks);
                    return Ok(());
                }
                _ = ticker.tick() => self.tick()?,
            }
        }
    }
}

impl<F, B, P> Drop for CaptureLoop<F, B, P>
where
    F: FrameSource,
    B: EncoderBackend,
    P: PreviewSurface,
{
    fn drop(&mut self) {
        self.close();
    }
}
