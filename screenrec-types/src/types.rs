//! Value types shared between the recording core and the CLI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Width and height of a frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels covered by this geometry.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Parse a `WIDTHxHEIGHT` string such as `640x360`.
    pub fn parse(s: &str) -> Option<Self> {
        let (w, h) = s.trim().split_once(['x', 'X'])?;
        let width = w.trim().parse().ok()?;
        let height = h.trim().parse().ok()?;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self { width, height })
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Uniform downscale applied to recorded frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScaleFactor {
    /// Keep the captured resolution
    #[default]
    #[serde(rename = "original")]
    Original,
    #[serde(rename = "1/2")]
    Half,
    #[serde(rename = "1/3")]
    Third,
    #[serde(rename = "1/4")]
    Quarter,
}

impl ScaleFactor {
    /// All selectable factors, largest first.
    pub const ALL: [ScaleFactor; 4] = [
        ScaleFactor::Original,
        ScaleFactor::Half,
        ScaleFactor::Third,
        ScaleFactor::Quarter,
    ];

    /// Integer divisor applied to both dimensions.
    pub fn divisor(&self) -> u32 {
        match self {
            ScaleFactor::Original => 1,
            ScaleFactor::Half => 2,
            ScaleFactor::Third => 3,
            ScaleFactor::Quarter => 4,
        }
    }

    /// Dimensions of a `width`x`height` frame after scaling.
    ///
    /// Truncates, so 1366 at 1/4 gives 341. Never returns a zero dimension.
    pub fn apply(&self, width: u32, height: u32) -> Geometry {
        let d = self.divisor();
        Geometry::new((width / d).max(1), (height / d).max(1))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleFactor::Original => "original",
            ScaleFactor::Half => "1/2",
            ScaleFactor::Third => "1/3",
            ScaleFactor::Quarter => "1/4",
        }
    }
}

impl FromStr for ScaleFactor {
    type Err = String;

    /// Parse from string (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "original" | "1" | "1/1" => Ok(ScaleFactor::Original),
            "1/2" | "half" | "0.5" => Ok(ScaleFactor::Half),
            "1/3" | "third" => Ok(ScaleFactor::Third),
            "1/4" | "quarter" | "0.25" => Ok(ScaleFactor::Quarter),
            _ => Err(format!("Invalid scale: {} (use original, 1/2, 1/3, 1/4)", s)),
        }
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capture rate in frames per second, always within `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct FrameRate(u32);

impl FrameRate {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 60;

    /// Clamp `fps` into the supported range.
    pub fn new(fps: u32) -> Self {
        Self(fps.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Milliseconds between ticks (`1000 / fps`, truncated).
    pub fn interval_ms(&self) -> u64 {
        1000 / self.0 as u64
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self(20)
    }
}

impl From<u32> for FrameRate {
    fn from(fps: u32) -> Self {
        Self::new(fps)
    }
}

impl From<FrameRate> for u32 {
    fn from(rate: FrameRate) -> Self {
        rate.0
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} fps", self.0)
    }
}

/// Video codec, chosen from the output file's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// MPEG-4 Part 2 tagged `mp4v`, used for `.mp4`
    Mp4v,
    /// MPEG-4 Part 2 tagged `XVID`, used for `.avi` and anything else
    Xvid,
}

impl Codec {
    /// Select the codec for an output path. Only `.mp4` maps to `Mp4v`.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("mp4") => Codec::Mp4v,
            _ => Codec::Xvid,
        }
    }

    /// Four-character code written into the container.
    pub fn fourcc(&self) -> &'static str {
        match self {
            Codec::Mp4v => "mp4v",
            Codec::Xvid => "XVID",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.fourcc())
    }
}

/// How the preview is fitted into its area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AspectMode {
    /// Preserve the aspect ratio and letterbox the remainder
    #[default]
    Keep,
    /// Stretch to fill the whole area
    Stretch,
}

/// Recording state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// Not recording; ticks only refresh the preview
    Idle,
    /// Frames are being written to the output file
    Recording,
}

/// Information about a display monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayInfo {
    /// Platform identifier
    pub id: u32,
    /// Display name for UI
    pub name: String,
    /// Virtual screen X position
    pub x: i32,
    /// Virtual screen Y position
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Whether this is the primary monitor
    pub is_primary: bool,
    /// Scale factor (e.g., 2.0 for Retina displays)
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f32,
}

fn default_scale_factor() -> f32 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_scale_factor_truncates() {
        assert_eq!(ScaleFactor::Original.apply(1920, 1080), Geometry::new(1920, 1080));
        assert_eq!(ScaleFactor::Half.apply(1920, 1080), Geometry::new(960, 540));
        assert_eq!(ScaleFactor::Third.apply(1920, 1080), Geometry::new(640, 360));
        assert_eq!(ScaleFactor::Quarter.apply(1366, 768), Geometry::new(341, 192));
        assert_eq!(ScaleFactor::Third.apply(1001, 7), Geometry::new(333, 2));
    }

    #[test]
    fn test_scale_factor_never_zero() {
        assert_eq!(ScaleFactor::Quarter.apply(3, 2), Geometry::new(1, 1));
    }

    #[test]
    fn test_scale_factor_parse() {
        assert_eq!("1/2".parse::<ScaleFactor>(), Ok(ScaleFactor::Half));
        assert_eq!("Original".parse::<ScaleFactor>(), Ok(ScaleFactor::Original));
        assert_eq!(" quarter ".parse::<ScaleFactor>(), Ok(ScaleFactor::Quarter));
        assert!("1/5".parse::<ScaleFactor>().unwrap_err().contains("1/5"));
        for factor in ScaleFactor::ALL {
            assert_eq!(factor.as_str().parse::<ScaleFactor>(), Ok(factor));
        }
    }

    #[test]
    fn test_scale_factor_serialization() {
        let json = serde_json::to_string(&ScaleFactor::Third).unwrap();
        assert_eq!(json, "\"1/3\"");
        let parsed: ScaleFactor = serde_json::from_str("\"original\"").unwrap();
        assert_eq!(parsed, ScaleFactor::Original);
    }

    #[test]
    fn test_frame_rate_clamps() {
        assert_eq!(FrameRate::new(0).get(), 1);
        assert_eq!(FrameRate::new(500).get(), 60);
        assert_eq!(FrameRate::new(20).interval_ms(), 50);
        assert_eq!(FrameRate::new(0).interval_ms(), 1000);
        assert_eq!(FrameRate::new(60).interval_ms(), 16);
        assert_eq!(FrameRate::default().get(), 20);
    }

    #[test]
    fn test_frame_rate_deserialize_clamps() {
        let rate: FrameRate = serde_json::from_str("0").unwrap();
        assert_eq!(rate.get(), 1);
        assert_eq!(serde_json::to_string(&FrameRate::new(30)).unwrap(), "30");
    }

    #[test]
    fn test_codec_from_path() {
        assert_eq!(Codec::from_path(&PathBuf::from("out.mp4")), Codec::Mp4v);
        assert_eq!(Codec::from_path(&PathBuf::from("OUT.MP4")), Codec::Mp4v);
        assert_eq!(Codec::from_path(&PathBuf::from("out.avi")), Codec::Xvid);
        assert_eq!(Codec::from_path(&PathBuf::from("out.mkv")), Codec::Xvid);
        assert_eq!(Codec::from_path(&PathBuf::from("noext")), Codec::Xvid);
        assert_eq!(Codec::Mp4v.fourcc(), "mp4v");
        assert_eq!(Codec::Xvid.fourcc(), "XVID");
    }

    #[test]
    fn test_geometry_parse() {
        assert_eq!(Geometry::parse("640x360"), Some(Geometry::new(640, 360)));
        assert_eq!(Geometry::parse(" 800X600 "), Some(Geometry::new(800, 600)));
        assert_eq!(Geometry::parse("0x10"), None);
        assert_eq!(Geometry::parse("640"), None);
        assert_eq!(Geometry::new(960, 540).to_string(), "960x540");
    }
}
