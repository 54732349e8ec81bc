//! Platform-specific logging directory resolution.

use std::path::PathBuf;

const APP_NAME: &str = "screenrec";

/// Returns the platform-appropriate directory for log files.
///
/// | Platform | Directory |
/// |----------|-----------|
/// | Linux | `$XDG_STATE_HOME/screenrec/logs` or `~/.local/state/screenrec/logs` |
/// | macOS | `~/Library/Logs/screenrec` |
/// | Windows | `%LOCALAPPDATA%\screenrec\screenrec\logs` |
///
/// Falls back to the system temp directory when no home directory can be found.
pub fn log_dir() -> PathBuf {
    let Some(base) = directories::ProjectDirs::from("", "", APP_NAME) else {
        return std::env::temp_dir().join(APP_NAME).join("logs");
    };

    #[cfg(target_os = "linux")]
    {
        base.state_dir()
            .unwrap_or_else(|| base.data_local_dir())
            .join("logs")
    }

    #[cfg(target_os = "macos")]
    {
        // data_local_dir is ~/Library/Application Support/screenrec
        let library = base
            .data_local_dir()
            .parent()
            .and_then(|p| p.parent())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| base.data_local_dir().to_path_buf());
        library.join("Logs").join(APP_NAME)
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        base.data_local_dir().join("logs")
    }
}

/// Ensures the log directory exists, creating it if necessary.
pub fn ensure_log_dir() -> Result<PathBuf, std::io::Error> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// File name prefix for the rolling log appender.
///
/// The appender creates dated files such as `screenrec.log.2026-03-01`.
pub const LOG_FILE_PREFIX: &str = "screenrec.log";
