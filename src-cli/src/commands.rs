//! CLI command implementations.

use crate::colors;
use crate::exit_codes::ExitCode;
use crate::{CaptureOptions, ConfigAction, RecordOptions};
use screenrec_core::capture::{list_displays, CaptureError, DisplaySource};
use screenrec_core::config::{self, AppConfig};
use screenrec_core::encoder::{ensure_ffmpeg, FfmpegBackend};
use screenrec_core::preview::{JpegFilePreview, NoPreview, PreviewError, PreviewSurface};
use screenrec_core::session::{CaptureLoop, RecordingSummary, SessionConfig, StartOutcome};
use screenrec_types::{FrameRate, Geometry};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

type Session = CaptureLoop<DisplaySource, FfmpegBackend, Box<dyn PreviewSurface>>;

/// Why the capture loop was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Signal,
    DurationLimit,
}

/// Apply command-line overrides on top of the loaded configuration.
fn apply_overrides(
    config: &mut AppConfig,
    scale: Option<&str>,
    capture: &CaptureOptions,
) -> Result<(), String> {
    if let Some(fps) = capture.fps {
        if !(FrameRate::MIN..=FrameRate::MAX).contains(&fps) {
            return Err(format!(
                "Frame rate must be between {} and {}",
                FrameRate::MIN,
                FrameRate::MAX
            ));
        }
        config.recording.fps = FrameRate::new(fps);
    }
    if let Some(scale) = scale {
        config.recording.scale = scale.parse()?;
    }
    if capture.stretch {
        config.recording.keep_aspect = false;
    }
    if let Some(size) = &capture.preview_size {
        let size = Geometry::parse(size)
            .ok_or_else(|| format!("Invalid preview size: {} (use WIDTHxHEIGHT)", size))?;
        config.preview.width = size.width;
        config.preview.height = size.height;
    }
    Ok(())
}

/// Pick the output file. An explicit empty path is passed through so the
/// session treats it as a cancelled choice.
fn resolve_output(output: Option<String>, config: &AppConfig) -> Result<Option<PathBuf>, String> {
    match output {
        Some(path) => Ok(Some(PathBuf::from(path))),
        None => {
            let path = config::default_output_path(config)?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create output directory: {}", e))?;
            }
            Ok(Some(path))
        }
    }
}

fn preview_surface(
    config: &AppConfig,
    capture: &CaptureOptions,
) -> Result<Box<dyn PreviewSurface>, PreviewError> {
    Ok(match &capture.preview {
        Some(path) => Box::new(JpegFilePreview::new(path, config.preview.size())?),
        None => Box::new(NoPreview),
    })
}

fn open_session(
    capture: &CaptureOptions,
    preview: Box<dyn PreviewSurface>,
    session_config: SessionConfig,
) -> Result<Session, CaptureError> {
    let source = match capture.display {
        Some(id) => DisplaySource::by_id(id)?,
        None => DisplaySource::primary()?,
    };
    let display_info = source.info();
    info!(
        "Capturing display {} '{}' ({}x{})",
        display_info.id, display_info.name, display_info.width, display_info.height
    );

    Ok(CaptureLoop::new(
        source,
        FfmpegBackend::new(),
        preview,
        session_config,
    ))
}

/// Resolves on SIGINT/SIGTERM (Ctrl+C on Windows). Never resolves if the
/// handlers cannot be installed.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => {}
                    _ = sigterm.recv() => {}
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Failed to install signal handlers: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Wait for a signal or the duration limit, printing elapsed time once a second.
async fn wait_for_stop(limit: Option<Duration>, show_elapsed: bool) -> StopReason {
    let deadline = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);
    let signal = shutdown_signal();
    tokio::pin!(signal);

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut seconds = 0u64;
    loop {
        tokio::select! {
            _ = &mut signal => return StopReason::Signal,
            _ = &mut deadline => return StopReason::DurationLimit,
            _ = ticker.tick() => {
                if show_elapsed {
                    eprint!(
                        "\r{} {}",
                        colors::recording("Recording:"),
                        colors::elapsed_time(seconds / 60, seconds % 60)
                    );
                    std::io::stderr().flush().ok();
                }
                seconds += 1;
            }
        }
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("{}", colors::error(&e.to_string())),
    }
}

fn summary_json(status: &str, summary: Option<&RecordingSummary>) -> serde_json::Value {
    match summary {
        Some(s) => serde_json::json!({
            "status": status,
            "file_path": s.output.to_string_lossy(),
            "codec": s.codec.fourcc(),
            "width": s.geometry.map(|g| g.width),
            "height": s.geometry.map(|g| g.height),
            "frames": s.frames_written,
            "duration_secs": s.duration.as_secs_f64(),
        }),
        None => serde_json::json!({ "status": status }),
    }
}

/// Record the primary (or chosen) display until stopped.
pub async fn record(options: RecordOptions, json: bool, quiet: bool) -> ExitCode {
    let mut app_config = config::load_config();
    if let Err(e) = apply_overrides(&mut app_config, options.scale.as_deref(), &options.capture) {
        eprintln!("{}", colors::error(&e));
        return ExitCode::InvalidArguments;
    }

    let preview = match preview_surface(&app_config, &options.capture) {
        Ok(preview) => preview,
        Err(e) => {
            eprintln!("{}", colors::error(&e.to_string()));
            return ExitCode::InvalidArguments;
        }
    };

    let output = match resolve_output(options.output, &app_config) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("{}", colors::error(&e));
            return ExitCode::GeneralError;
        }
    };

    let session_config = SessionConfig::from(&app_config.recording);
    let mut session = match open_session(&options.capture, preview, session_config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}", colors::error(&e.to_string()));
            return ExitCode::RecordingFailedToStart;
        }
    };

    match session.start(output) {
        StartOutcome::Started => {}
        StartOutcome::Cancelled => {
            if json {
                print_json(&serde_json::json!({ "status": "cancelled" }));
            } else if !quiet {
                eprintln!("{}", colors::info("No output file chosen. Nothing recorded."));
            }
            return ExitCode::UserCancelled;
        }
        StartOutcome::AlreadyRecording => {
            eprintln!("{}", colors::error("A recording is already in progress."));
            return ExitCode::GeneralError;
        }
    }

    if let Err(e) = ensure_ffmpeg() {
        session.stop();
        eprintln!("{}", colors::error(&e));
        return ExitCode::RecordingFailedToStart;
    }

    if json {
        print_json(&serde_json::json!({
            "status": "recording_started",
            "file_path": session.output_path().map(|p| p.to_string_lossy().to_string()),
        }));
    } else if !quiet {
        if let Some(path) = session.output_path() {
            eprintln!(
                "{} {}",
                colors::success("Recording to"),
                colors::path(&path.display().to_string())
            );
        }
    }

    let show_elapsed = !quiet && !json;
    let limit = options.capture.duration.map(Duration::from_secs);
    let mut stop_reason = None;
    let result = session
        .run(async {
            stop_reason = Some(wait_for_stop(limit, show_elapsed).await);
        })
        .await;

    let summary = session.close().or_else(|| session.last_summary().cloned());

    if let Err(e) = result {
        if json {
            let mut value = summary_json("recording_failed", summary.as_ref());
            value["error"] = serde_json::Value::String(e.to_string());
            print_json(&value);
        } else {
            eprintln!("\n{}", colors::error(&e.to_string()));
            if let Some(s) = summary.as_ref().filter(|s| s.frames_written > 0) {
                eprintln!(
                    "{} {}",
                    colors::warning("Partial recording kept at"),
                    colors::path(&s.output.display().to_string())
                );
            }
        }
        return ExitCode::RecordingFailedDuringCapture;
    }

    if show_elapsed {
        let message = match stop_reason {
            Some(StopReason::DurationLimit) => "Duration limit reached. Recording stopped.",
            _ => "Recording stopped.",
        };
        eprintln!("\n{}", colors::info(message));
    }

    if json {
        print_json(&summary_json("recording_stopped", summary.as_ref()));
    } else if !quiet {
        match summary {
            Some(s) if s.frames_written > 0 => {
                println!(
                    "{} {}",
                    colors::success("Recording saved:"),
                    colors::path(&s.output.display().to_string())
                );
                if let Some(geometry) = s.geometry {
                    println!(
                        "{}",
                        colors::dim(&format!(
                            "{} frames, {}, {}, {:.1}s",
                            s.frames_written,
                            geometry,
                            s.codec,
                            s.duration.as_secs_f64()
                        ))
                    );
                }
            }
            _ => eprintln!("{}", colors::warning("No frames were recorded.")),
        }
    }
    ExitCode::Success
}

/// Refresh the preview surface without recording.
pub async fn preview(capture: CaptureOptions, json: bool, quiet: bool) -> ExitCode {
    let Some(path) = capture.preview.clone() else {
        eprintln!("{}", colors::error("--preview <FILE> is required for the preview command."));
        return ExitCode::InvalidArguments;
    };

    let mut app_config = config::load_config();
    if let Err(e) = apply_overrides(&mut app_config, None, &capture) {
        eprintln!("{}", colors::error(&e));
        return ExitCode::InvalidArguments;
    }

    let preview = match preview_surface(&app_config, &capture) {
        Ok(preview) => preview,
        Err(e) => {
            eprintln!("{}", colors::error(&e.to_string()));
            return ExitCode::InvalidArguments;
        }
    };

    let session_config = SessionConfig::from(&app_config.recording);
    let mut session = match open_session(&capture, preview, session_config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}", colors::error(&e.to_string()));
            return ExitCode::RecordingFailedToStart;
        }
    };

    if json {
        print_json(&serde_json::json!({
            "status": "previewing",
            "preview_path": path.to_string_lossy(),
        }));
    } else if !quiet {
        eprintln!(
            "{} {}",
            colors::info("Previewing to"),
            colors::path(&path.display().to_string())
        );
    }

    let limit = capture.duration.map(Duration::from_secs);
    match session.run(async {
        wait_for_stop(limit, false).await;
    })
    .await
    {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("{}", colors::error(&e.to_string()));
            ExitCode::GeneralError
        }
    }
}

/// List available displays.
pub fn displays(json: bool, quiet: bool) -> ExitCode {
    let displays = match list_displays() {
        Ok(displays) => displays,
        Err(e) => {
            eprintln!("{}", colors::error(&e.to_string()));
            return ExitCode::GeneralError;
        }
    };

    if json {
        match serde_json::to_string_pretty(&displays) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("{}", colors::error(&e.to_string()));
                return ExitCode::GeneralError;
            }
        }
        return ExitCode::Success;
    }

    if displays.is_empty() {
        if !quiet {
            println!("{}", colors::dim("No displays found."));
        }
        return ExitCode::Success;
    }

    let id_width = displays
        .iter()
        .map(|d| d.id.to_string().len())
        .max()
        .unwrap_or(2)
        .max(2);
    let name_width = displays
        .iter()
        .map(|d| d.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!(
        "{}  {}  {}  {}  {}",
        colors::pad_left("ID", id_width, colors::header),
        colors::pad_left("NAME", name_width, colors::header),
        colors::pad_left("RESOLUTION", 14, colors::header),
        colors::pad_left("POSITION", 10, colors::header),
        colors::header("PRIMARY")
    );
    println!(
        "{}  {}  {}  {}  {}",
        "-".repeat(id_width),
        "-".repeat(name_width),
        "-".repeat(14),
        "-".repeat(10),
        "-".repeat(7)
    );

    for display in displays {
        let resolution = format!("{}x{}", display.width, display.height);
        let position = format!("{},{}", display.x, display.y);
        let primary = if display.is_primary {
            colors::yes()
        } else {
            colors::no()
        };
        println!(
            "{}  {:<name_width$}  {:<14}  {:<10}  {}",
            colors::pad_left(&display.id.to_string(), id_width, colors::number),
            display.name,
            resolution,
            position,
            primary
        );
    }
    ExitCode::Success
}

/// Show, locate or edit the config file.
pub fn config(action: ConfigAction, json: bool, quiet: bool) -> ExitCode {
    match action {
        ConfigAction::Show => {
            let app_config = config::load_config();
            match serde_json::to_string_pretty(&app_config) {
                Ok(s) => {
                    println!("{}", s);
                    ExitCode::Success
                }
                Err(e) => {
                    eprintln!("{}", colors::error(&e.to_string()));
                    ExitCode::GeneralError
                }
            }
        }
        ConfigAction::Path => match config::config_path() {
            Ok(path) => {
                if json {
                    print_json(&serde_json::json!({ "path": path.to_string_lossy() }));
                } else {
                    println!("{}", colors::path(&path.display().to_string()));
                }
                ExitCode::Success
            }
            Err(e) => {
                eprintln!("{}", colors::error(&e));
                ExitCode::GeneralError
            }
        },
        ConfigAction::Set { key, value } => {
            let mut app_config = config::load_config();
            if let Err(e) = app_config.set(&key, &value) {
                eprintln!("{}", colors::error(&e));
                return ExitCode::InvalidArguments;
            }
            match config::save_config(&app_config) {
                Ok(path) => {
                    if json {
                        print_json(&serde_json::json!({
                            "status": "saved",
                            "key": key,
                            "value": value,
                            "path": path.to_string_lossy(),
                        }));
                    } else if !quiet {
                        println!("{} {} = {}", colors::success("Set"), key, value);
                    }
                    ExitCode::Success
                }
                Err(e) => {
                    eprintln!("{}", colors::error(&e));
                    ExitCode::GeneralError
                }
            }
        }
    }
}

/// Show version information.
pub fn version(json: bool) {
    let version = env!("CARGO_PKG_VERSION");
    if json {
        print_json(&serde_json::json!({ "version": version }));
    } else {
        println!("{} {}", colors::bold("screenrec"), version);
    }
}
