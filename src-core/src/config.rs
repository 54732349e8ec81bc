//! Configuration management for screenrec.
//!
//! Persisted defaults live in the platform-standard config directory:
//! - Linux: `~/.config/screenrec/config.json`
//! - macOS: `~/Library/Application Support/screenrec/config.json`
//! - Windows: `%APPDATA%\screenrec\config\config.json`
//!
//! Command-line flags override whatever is loaded here.

use crate::preview::DEFAULT_PREVIEW_SIZE;
use chrono::Local;
use directories::{ProjectDirs, UserDirs};
use screenrec_types::{AspectMode, FrameRate, Geometry, ScaleFactor};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Recording-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Capture rate, clamped to 1..=60.
    #[serde(default)]
    pub fps: FrameRate,
    /// Downscale applied to recorded frames.
    #[serde(default)]
    pub scale: ScaleFactor,
    /// Whether the preview keeps the display's aspect ratio.
    #[serde(default = "default_keep_aspect")]
    pub keep_aspect: bool,
}

fn default_keep_aspect() -> bool {
    true
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            fps: FrameRate::default(),
            scale: ScaleFactor::default(),
            keep_aspect: true,
        }
    }
}

impl RecordingConfig {
    pub fn aspect(&self) -> AspectMode {
        if self.keep_aspect {
            AspectMode::Keep
        } else {
            AspectMode::Stretch
        }
    }
}

/// Preview-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_preview_width")]
    pub width: u32,
    #[serde(default = "default_preview_height")]
    pub height: u32,
}

fn default_preview_width() -> u32 {
    DEFAULT_PREVIEW_SIZE.width
}

fn default_preview_height() -> u32 {
    DEFAULT_PREVIEW_SIZE.height
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_PREVIEW_SIZE.width,
            height: DEFAULT_PREVIEW_SIZE.height,
        }
    }
}

impl PreviewConfig {
    pub fn size(&self) -> Geometry {
        Geometry::new(self.width.max(1), self.height.max(1))
    }
}

/// Output-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Custom output directory. If None, uses system default (Videos folder).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// Update one setting from its dotted key, e.g. `recording.fps`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "recording.fps" => {
                let fps: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid frame rate: {}", value))?;
                self.recording.fps = FrameRate::new(fps);
            }
            "recording.scale" => {
                self.recording.scale = value.parse()?;
            }
            "recording.keep_aspect" => {
                self.recording.keep_aspect = value
                    .parse()
                    .map_err(|_| format!("Invalid boolean: {}", value))?;
            }
            "preview.size" => {
                let size = Geometry::parse(value)
                    .ok_or_else(|| format!("Invalid size: {} (use WIDTHxHEIGHT)", value))?;
                self.preview.width = size.width;
                self.preview.height = size.height;
            }
            "output.directory" => {
                self.output.directory = if value.is_empty() {
                    None
                } else {
                    validate_directory(value)?;
                    Some(value.to_string())
                };
            }
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }
}

/// Get the path to the config file.
pub fn config_path() -> Result<PathBuf, String> {
    let proj_dirs =
        ProjectDirs::from("", "", "screenrec").ok_or("Could not determine config directory")?;
    Ok(proj_dirs.config_dir().join("config.json"))
}

/// Load configuration from disk.
/// Returns default config if file doesn't exist or is invalid.
pub fn load_config() -> AppConfig {
    match config_path() {
        Ok(path) => load_config_from(&path),
        Err(e) => {
            warn!("Failed to get config path: {}", e);
            AppConfig::default()
        }
    }
}

/// Load configuration from a specific file, falling back to defaults.
pub fn load_config_from(path: &Path) -> AppConfig {
    if !path.exists() {
        debug!("No config file at {:?}, using defaults", path);
        return AppConfig::default();
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
            Ok(config) => {
                debug!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                warn!("Failed to parse config file: {}. Using defaults.", e);
                AppConfig::default()
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}. Using defaults.", e);
            AppConfig::default()
        }
    }
}

/// Save configuration to disk.
pub fn save_config(config: &AppConfig) -> Result<PathBuf, String> {
    let path = config_path()?;
    save_config_to(config, &path)?;
    Ok(path)
}

/// Save configuration to a specific file, creating its directory.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    fs::write(path, json).map_err(|e| format!("Failed to write config file: {}", e))?;

    info!("Saved config to {:?}", path);
    Ok(())
}

/// Get the default output directory (system Videos folder).
pub fn get_default_output_dir() -> Result<PathBuf, String> {
    let user_dirs = UserDirs::new().ok_or("Could not determine user directories")?;

    let output_dir = user_dirs
        .video_dir()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| {
            let home = user_dirs.home_dir().to_path_buf();
            let videos = home.join("Videos");
            if videos.exists() || fs::create_dir_all(&videos).is_ok() {
                return videos;
            }
            home
        });

    Ok(output_dir)
}

/// Get the configured output directory, falling back to default if not set.
pub fn get_output_dir(config: &AppConfig) -> Result<PathBuf, String> {
    match &config.output.directory {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => get_default_output_dir(),
    }
}

/// Default file name for a recording started now, e.g. `screen_20260301_142501.mp4`.
pub fn default_file_name() -> String {
    format!("screen_{}.mp4", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Full default output path inside the configured output directory.
pub fn default_output_path(config: &AppConfig) -> Result<PathBuf, String> {
    Ok(get_output_dir(config)?.join(default_file_name()))
}

/// Validate that a directory exists and is writable.
pub fn validate_directory(path: &str) -> Result<(), String> {
    let path = PathBuf::from(path);

    if !path.exists() {
        return Err("Directory does not exist".to_string());
    }

    if !path.is_dir() {
        return Err("Path is not a directory".to_string());
    }

    let test_file = path.join(".screenrec_write_test");
    match fs::write(&test_file, "test") {
        Ok(()) => {
            let _ = fs::remove_file(test_file);
            Ok(())
        }
        Err(_) => Err("Directory is not writable".to_string()),
    }
}
