//! Primary-display capture using the xcap crate.

use super::error::CaptureError;
use super::types::Frame;
use super::FrameSource;
use screenrec_types::DisplayInfo;
use tracing::debug;
use xcap::Monitor;

/// Captures a whole monitor on every call.
pub struct DisplaySource {
    monitor: Monitor,
}

impl DisplaySource {
    /// Select the primary monitor, or the first one if none reports primary.
    pub fn primary() -> Result<Self, CaptureError> {
        let mut monitors = all_monitors()?;
        if monitors.is_empty() {
            return Err(CaptureError::TargetNotFound("no displays connected".to_string()));
        }
        let index = monitors.iter().position(|m| m.is_primary()).unwrap_or(0);
        Ok(Self {
            monitor: monitors.swap_remove(index),
        })
    }

    /// Select a monitor by its platform id.
    pub fn by_id(id: u32) -> Result<Self, CaptureError> {
        all_monitors()?
            .into_iter()
            .find(|m| m.id() == id)
            .map(|monitor| Self { monitor })
            .ok_or_else(|| CaptureError::TargetNotFound(format!("display {}", id)))
    }

    pub fn info(&self) -> DisplayInfo {
        display_info(&self.monitor)
    }
}

impl FrameSource for DisplaySource {
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        let image = self
            .monitor
            .capture_image()
            .map_err(|e| CaptureError::PlatformError(e.to_string()))?;
        let (width, height) = (image.width(), image.height());
        debug!("Captured {}x{}", width, height);
        Frame::from_rgba(width, height, image.into_raw())
    }
}

/// List all connected monitors.
pub fn list_displays() -> Result<Vec<DisplayInfo>, CaptureError> {
    Ok(all_monitors()?.iter().map(display_info).collect())
}

fn all_monitors() -> Result<Vec<Monitor>, CaptureError> {
    Monitor::all().map_err(|e| CaptureError::PlatformError(e.to_string()))
}

fn display_info(monitor: &Monitor) -> DisplayInfo {
    DisplayInfo {
        id: monitor.id(),
        name: monitor.name().to_string(),
        x: monitor.x(),
        y: monitor.y(),
        width: monitor.width(),
        height: monitor.height(),
        is_primary: monitor.is_primary(),
        scale_factor: monitor.scale_factor(),
    }
}
