//! screenrec command-line interface
//!
//! Records the primary display to an MPEG-4 file, with an optional JPEG
//! preview refreshed on every captured frame.

mod colors;
mod commands;
mod exit_codes;
mod logging;

use clap::{Args, Parser, Subcommand};
use exit_codes::ExitCode;
use std::path::PathBuf;

/// screenrec - Screen Recording CLI
#[derive(Parser, Debug)]
#[command(name = "screenrec")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format for scripting
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record the screen until Ctrl+C or the duration limit
    Record(RecordOptions),
    /// Refresh the preview image without recording
    Preview {
        #[command(flatten)]
        capture: CaptureOptions,
    },
    /// List available displays
    Displays,
    /// Show or edit persistent settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Set a value, e.g. `recording.fps 30` or `preview.size 800x450`
    Set { key: String, value: String },
}

#[derive(Args, Debug, Clone)]
pub struct RecordOptions {
    /// Output file; `.mp4` uses the mp4v tag, anything else XVID.
    /// Defaults to screen_<timestamp>.mp4 in the configured output directory
    #[arg(short, long)]
    pub output: Option<String>,

    /// Downscale recorded frames: original, 1/2, 1/3 or 1/4
    #[arg(long)]
    pub scale: Option<String>,

    #[command(flatten)]
    pub capture: CaptureOptions,
}

#[derive(Args, Debug, Clone)]
pub struct CaptureOptions {
    /// Frames per second (1-60)
    #[arg(long)]
    pub fps: Option<u32>,

    /// Stretch the preview instead of keeping the aspect ratio
    #[arg(long)]
    pub stretch: bool,

    /// Write a live JPEG preview to this file
    #[arg(long, value_name = "FILE")]
    pub preview: Option<PathBuf>,

    /// Preview image size
    #[arg(long, value_name = "WxH")]
    pub preview_size: Option<String>,

    /// Auto-stop after duration (seconds)
    #[arg(short, long)]
    pub duration: Option<u64>,

    /// Display ID to capture instead of the primary display
    #[arg(long)]
    pub display: Option<u32>,
}

fn main() {
    let cli = Cli::parse();
    let guard = logging::init(cli.verbose, cli.quiet);

    let exit_code = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(run(cli)),
        Err(e) => {
            eprintln!(
                "{}",
                colors::error(&format!("Failed to create Tokio runtime: {}", e))
            );
            ExitCode::GeneralError
        }
    };

    // process::exit skips destructors; flush the log file first
    drop(guard);
    std::process::exit(exit_code.as_i32());
}

async fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Commands::Record(options) => commands::record(options, cli.json, cli.quiet).await,
        Commands::Preview { capture } => commands::preview(capture, cli.json, cli.quiet).await,
        Commands::Displays => commands::displays(cli.json, cli.quiet),
        Commands::Config { action } => commands::config(action, cli.json, cli.quiet),
        Commands::Version => {
            commands::version(cli.json);
            ExitCode::Success
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    /// Verify the CLI definition is valid
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_record_defaults() {
        let cli = Cli::try_parse_from(["screenrec", "record"]).unwrap();
        assert!(!cli.json);
        match cli.command {
            Commands::Record(options) => {
                assert!(options.output.is_none());
                assert!(options.scale.is_none());
                assert!(options.capture.fps.is_none());
                assert!(!options.capture.stretch);
                assert!(options.capture.duration.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parse_record_with_options() {
        let cli = Cli::try_parse_from([
            "screenrec",
            "record",
            "-o",
            "clip.avi",
            "--fps",
            "30",
            "--scale",
            "1/2",
            "--stretch",
            "--preview",
            "live.jpg",
            "--preview-size",
            "320x180",
            "-d",
            "10",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Record(options) => {
                assert_eq!(options.output.as_deref(), Some("clip.avi"));
                assert_eq!(options.scale.as_deref(), Some("1/2"));
                assert_eq!(options.capture.fps, Some(30));
                assert!(options.capture.stretch);
                assert_eq!(options.capture.preview, Some(PathBuf::from("live.jpg")));
                assert_eq!(options.capture.preview_size.as_deref(), Some("320x180"));
                assert_eq!(options.capture.duration, Some(10));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parse_empty_output_is_accepted() {
        let cli = Cli::try_parse_from(["screenrec", "record", "--output", ""]).unwrap();
        match cli.command {
            Commands::Record(options) => assert_eq!(options.output.as_deref(), Some("")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parse_config_set() {
        let cli = Cli::try_parse_from(["screenrec", "config", "set", "recording.fps", "25"]).unwrap();
        match cli.command {
            Commands::Config {
                action: ConfigAction::Set { key, value },
            } => {
                assert_eq!(key, "recording.fps");
                assert_eq!(value, "25");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parse_preview_and_global_flags() {
        let cli = Cli::try_parse_from(["screenrec", "-q", "preview", "--preview", "p.jpg"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Preview { .. }));

        let cli = Cli::try_parse_from(["screenrec", "displays", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Displays));
    }

    #[test]
    fn parse_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["screenrec", "stop"]).is_err());
    }
}
