//! FFmpeg-backed encoder using ffmpeg-sidecar.
//!
//! Raw `bgr24` frames are piped to an FFmpeg child process over stdin. A
//! sidecar binary next to the executable is preferred (this is also where
//! auto-download puts it), falling back to `ffmpeg` on PATH.

use super::{check_geometry, EncoderBackend, EncoderError, EncoderTarget, FrameSink};
use crate::capture::ColorBuffer;
use ffmpeg_sidecar::command::FfmpegCommand;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use tracing::{debug, info, warn};

/// FFmpeg encoder used for both codecs; the fourcc only changes the stream tag.
const VIDEO_ENCODER: &str = "mpeg4";

/// Constant quantizer for `mpeg4` (2 = best, 31 = worst).
const QUANTIZER: &str = "5";

/// Resolve the path to the FFmpeg binary: the sidecar next to current_exe()
/// if present, otherwise `ffmpeg` from PATH.
fn resolve_ffmpeg_path() -> PathBuf {
    ffmpeg_sidecar::paths::ffmpeg_path()
}

/// Start the child in its own process group so a terminal Ctrl+C reaches only
/// us. The encoder is then finished by closing its stdin.
fn isolate_from_terminal_signals(command: &mut Command) {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        command.creation_flags(CREATE_NO_WINDOW | CREATE_NEW_PROCESS_GROUP);
    }
}

/// Verify that FFmpeg can be executed, downloading it on Linux as a last resort.
pub fn ensure_ffmpeg() -> Result<(), String> {
    let ffmpeg = resolve_ffmpeg_path();
    debug!("FFmpeg resolved to {}", ffmpeg.display());

    match Command::new(&ffmpeg)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(format!(
            "FFmpeg binary at {} exited with status: {}",
            ffmpeg.display(),
            status
        )),
        Err(e) => {
            warn!("FFmpeg not found at {}: {}", ffmpeg.display(), e);
            #[cfg(target_os = "linux")]
            {
                info!("Attempting FFmpeg auto-download...");
                ffmpeg_sidecar::download::auto_download()
                    .map_err(|e| format!("FFmpeg not found and auto-download failed: {}", e))
            }
            #[cfg(not(target_os = "linux"))]
            {
                Err(format!(
                    "Bundled FFmpeg not found at {}. The application may not be installed correctly.",
                    ffmpeg.display()
                ))
            }
        }
    }
}

/// Check whether `ffmpeg -encoders` lists `name`.
fn has_encoder(name: &str) -> bool {
    let output = match Command::new(resolve_ffmpeg_path())
        .args(["-encoders", "-hide_banner"])
        .output()
    {
        Ok(o) => String::from_utf8_lossy(&o.stdout).to_string(),
        Err(e) => {
            warn!("Failed to run ffmpeg -encoders: {}", e);
            return false;
        }
    };
    encoder_listed(&output, name)
}

fn encoder_listed(encoders_output: &str, name: &str) -> bool {
    encoders_output
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some(name))
}

/// FFmpeg arguments for encoding stdin frames into `target`.
pub fn encoder_args(target: &EncoderTarget) -> Vec<String> {
    let geometry = target.geometry;
    let mut args: Vec<String> = vec![
        "-loglevel".into(),
        "warning".into(),
        // Input: raw BGR frames from stdin
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "bgr24".into(),
        "-s".into(),
        geometry.to_string(),
        "-r".into(),
        target.fps.get().to_string(),
        "-i".into(),
        "-".into(),
    ];

    // yuv420p needs even dimensions
    if geometry.width % 2 != 0 || geometry.height % 2 != 0 {
        args.push("-vf".into());
        args.push("pad=ceil(iw/2)*2:ceil(ih/2)*2".into());
    }

    args.extend([
        "-c:v".into(),
        VIDEO_ENCODER.into(),
        "-vtag".into(),
        target.codec.fourcc().into(),
        "-q:v".into(),
        QUANTIZER.into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-y".into(),
        target.path.to_string_lossy().to_string(),
    ]);
    args
}

/// Opens FFmpeg encoder processes.
#[derive(Default)]
pub struct FfmpegBackend {
    encoder_available: Option<bool>,
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EncoderBackend for FfmpegBackend {
    type Sink = FfmpegSink;

    fn open(&mut self, target: &EncoderTarget) -> Result<FfmpegSink, EncoderError> {
        let available = *self
            .encoder_available
            .get_or_insert_with(|| has_encoder(VIDEO_ENCODER));
        if !available {
            return Err(EncoderError::CannotOpen(format!(
                "FFmpeg does not provide the '{}' encoder needed for {}",
                VIDEO_ENCODER, target.codec
            )));
        }

        let mut command = FfmpegCommand::new_with_path(resolve_ffmpeg_path());
        command.args(encoder_args(target));

        let inner = command.as_inner_mut();
        inner.stdin(Stdio::piped());
        inner.stdout(Stdio::null());
        inner.stderr(Stdio::piped());
        isolate_from_terminal_signals(inner);

        let mut child = inner
            .spawn()
            .map_err(|e| EncoderError::CannotOpen(format!("Failed to start FFmpeg: {}", e)))?;

        let stdin = match child.stdin.take() {
            Some(stdin) => stdin,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(EncoderError::CannotOpen("Failed to get FFmpeg stdin".to_string()));
            }
        };

        if let Some(stderr) = child.stderr.take() {
            std::thread::spawn(move || {
                use std::io::{BufRead, BufReader};
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    warn!(target: "ffmpeg", "{}", line);
                }
            });
        }

        if let Ok(Some(status)) = child.try_wait() {
            return Err(EncoderError::CannotOpen(format!(
                "FFmpeg exited immediately with {}",
                status
            )));
        }

        info!(
            "Encoder opened: {} {} @ {} ({})",
            target.path.display(),
            target.geometry,
            target.fps,
            target.codec
        );

        Ok(FfmpegSink {
            stdin: Some(stdin),
            child: Some(child),
            target: target.clone(),
            frames_written: 0,
        })
    }
}

/// A running FFmpeg process fed through its stdin.
pub struct FfmpegSink {
    stdin: Option<ChildStdin>,
    child: Option<Child>,
    target: EncoderTarget,
    frames_written: u64,
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, buffer: &ColorBuffer) -> Result<(), EncoderError> {
        check_geometry(self.target.geometry, buffer)?;
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| EncoderError::WriteFailed("encoder is closed".to_string()))?;
        stdin
            .write_all(&buffer.data)
            .map_err(|e| EncoderError::WriteFailed(e.to_string()))?;
        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) {
        // Closing stdin signals end of input
        drop(self.stdin.take());

        let Some(mut child) = self.child.take() else {
            return;
        };
        match child.wait() {
            Ok(status) if status.success() => info!(
                "Encoder closed: {} ({} frames)",
                self.target.path.display(),
                self.frames_written
            ),
            Ok(status) => warn!("FFmpeg exited with {} while closing", status),
            Err(e) => warn!("Failed to wait for FFmpeg: {}", e),
        }
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.close();
    }
}
