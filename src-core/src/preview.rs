//! Live preview rendering.
//!
//! Each tick the captured frame is fitted into the preview area, letterboxed
//! or stretched, and handed to a [`PreviewSurface`].

use crate::capture::{Frame, BGRA_CHANNELS};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use screenrec_types::{AspectMode, Geometry};
use std::fmt;
use std::fs;
use std::io::BufWriter;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Default preview area, matching a 640x360 preview pane.
pub const DEFAULT_PREVIEW_SIZE: Geometry = Geometry::new(640, 360);

/// JPEG quality for preview images (0-100).
const JPEG_QUALITY: u8 = 75;

/// Letterbox fill color.
const LETTERBOX: Rgb<u8> = Rgb([17, 17, 17]);

/// Error type for preview operations.
#[derive(Debug)]
pub enum PreviewError {
    /// The frame could not be turned into an image
    Render(String),
    /// Writing the preview failed
    Io(String),
    /// The preview path does not name a JPEG file
    UnsupportedFormat(String),
}

impl fmt::Display for PreviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewError::Render(msg) => write!(f, "Preview render failed: {}", msg),
            PreviewError::Io(msg) => write!(f, "Preview write failed: {}", msg),
            PreviewError::UnsupportedFormat(path) => {
                write!(f, "Preview must be a .jpg or .jpeg file: {}", path)
            }
        }
    }
}

impl std::error::Error for PreviewError {}

/// Receives one frame per tick for on-screen feedback.
pub trait PreviewSurface {
    fn present(&mut self, frame: &Frame, aspect: AspectMode) -> Result<(), PreviewError>;
}

impl<T: PreviewSurface + ?Sized> PreviewSurface for Box<T> {
    fn present(&mut self, frame: &Frame, aspect: AspectMode) -> Result<(), PreviewError> {
        (**self).present(frame, aspect)
    }
}

/// Discards every frame.
#[derive(Debug, Default)]
pub struct NoPreview;

impl PreviewSurface for NoPreview {
    fn present(&mut self, _frame: &Frame, _aspect: AspectMode) -> Result<(), PreviewError> {
        Ok(())
    }
}

/// Keeps a JPEG file on disk showing the latest frame.
///
/// The file is replaced atomically so viewers never read a partial image.
pub struct JpegFilePreview {
    path: PathBuf,
    area: Geometry,
}

impl JpegFilePreview {
    /// Only `.jpg` and `.jpeg` paths (any case) are accepted.
    pub fn new(path: impl Into<PathBuf>, area: Geometry) -> Result<Self, PreviewError> {
        let path = path.into();
        let is_jpeg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
        if !is_jpeg {
            return Err(PreviewError::UnsupportedFormat(path.display().to_string()));
        }
        Ok(Self { path, area })
    }

    fn write(&self, image: &RgbImage) -> Result<(), PreviewError> {
        let tmp = temp_path(&self.path);
        {
            let file = fs::File::create(&tmp).map_err(|e| PreviewError::Io(e.to_string()))?;
            let mut writer = BufWriter::new(file);
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
                .encode_image(image)
                .map_err(|e| PreviewError::Io(e.to_string()))?;
        }
        fs::rename(&tmp, &self.path).map_err(|e| PreviewError::Io(e.to_string()))
    }
}

impl PreviewSurface for JpegFilePreview {
    fn present(&mut self, frame: &Frame, aspect: AspectMode) -> Result<(), PreviewError> {
        let image = render_preview(frame, self.area, aspect)?;
        self.write(&image)
    }
}

/// `live.jpg` -> `live.jpg.tmp`, next to the target so the rename stays atomic.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("preview"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Render `frame` into an image of exactly `area`.
pub fn render_preview(
    frame: &Frame,
    area: Geometry,
    aspect: AspectMode,
) -> Result<RgbImage, PreviewError> {
    let source = bgra_to_rgb(frame)?;

    match aspect {
        AspectMode::Stretch => Ok(imageops::resize(
            &source,
            area.width,
            area.height,
            FilterType::Triangle,
        )),
        AspectMode::Keep => {
            let fitted = fit_within(frame.geometry(), area);
            let scaled = imageops::resize(&source, fitted.width, fitted.height, FilterType::Triangle);
            let mut canvas = RgbImage::from_pixel(area.width, area.height, LETTERBOX);
            let x = (area.width - fitted.width) / 2;
            let y = (area.height - fitted.height) / 2;
            imageops::replace(&mut canvas, &scaled, x as i64, y as i64);
            Ok(canvas)
        }
    }
}

fn bgra_to_rgb(frame: &Frame) -> Result<RgbImage, PreviewError> {
    let mut rgb = Vec::with_capacity(frame.geometry().pixel_count() * 3);
    for px in frame.data.chunks_exact(BGRA_CHANNELS) {
        rgb.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    RgbImage::from_raw(frame.width, frame.height, rgb)
        .ok_or_else(|| PreviewError::Render("Failed to create image buffer".to_string()))
}

/// Largest size with the source's aspect ratio that fits inside `area`.
fn fit_within(source: Geometry, area: Geometry) -> Geometry {
    if source.width == 0 || source.height == 0 {
        return area;
    }

    let width_ratio = area.width as f64 / source.width as f64;
    let height_ratio = area.height as f64 / source.height as f64;
    let scale = width_ratio.min(height_ratio);

    let width = ((source.width as f64) * scale).round() as u32;
    let height = ((source.height as f64) * scale).round() as u32;

    Geometry::new(width.clamp(1, area.width), height.clamp(1, area.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32, bgra: [u8; 4]) -> Frame {
        Frame::from_bgra(width, height, bgra.repeat((width * height) as usize)).unwrap()
    }

    #[test]
    fn test_fit_within_landscape() {
        assert_eq!(
            fit_within(Geometry::new(1920, 1080), Geometry::new(640, 360)),
            Geometry::new(640, 360)
        );
        assert_eq!(
            fit_within(Geometry::new(1920, 1200), Geometry::new(640, 360)),
            Geometry::new(576, 360)
        );
    }

    #[test]
    fn test_fit_within_portrait_and_upscale() {
        assert_eq!(
            fit_within(Geometry::new(1080, 1920), Geometry::new(640, 360)),
            Geometry::new(203, 360)
        );
        assert_eq!(
            fit_within(Geometry::new(100, 50), Geometry::new(640, 360)),
            Geometry::new(640, 320)
        );
    }

    #[test]
    fn test_keep_aspect_letterboxes() {
        // Square red frame into a wide area: bars left and right
        let image = render_preview(&frame(10, 10, [0, 0, 255, 255]), Geometry::new(40, 20), AspectMode::Keep)
            .unwrap();
        assert_eq!(image.dimensions(), (40, 20));
        assert_eq!(*image.get_pixel(0, 10), LETTERBOX);
        assert_eq!(*image.get_pixel(39, 10), LETTERBOX);
        assert_eq!(*image.get_pixel(20, 10), Rgb([255, 0, 0]));
    }

    #[test]
    fn test_stretch_fills_area() {
        let image = render_preview(&frame(10, 10, [255, 0, 0, 255]), Geometry::new(40, 20), AspectMode::Stretch)
            .unwrap();
        assert_eq!(image.dimensions(), (40, 20));
        assert_eq!(*image.get_pixel(0, 0), Rgb([0, 0, 255]));
        assert_eq!(*image.get_pixel(39, 19), Rgb([0, 0, 255]));
    }

    #[test]
    fn test_jpeg_preview_writes_file() {
        let path = std::env::temp_dir().join(format!("screenrec_preview_{}.jpg", std::process::id()));
        let mut preview = JpegFilePreview::new(&path, Geometry::new(32, 18)).unwrap();
        preview
            .present(&frame(64, 36, [0, 128, 0, 255]), AspectMode::Keep)
            .unwrap();

        let written = image::open(&path).unwrap();
        assert_eq!((written.width(), written.height()), (32, 18));
        assert!(!temp_path(&path).exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_temp_path_keeps_full_name() {
        assert_eq!(temp_path(Path::new("out/live.jpg")), PathBuf::from("out/live.jpg.tmp"));
        assert_eq!(temp_path(Path::new("live.JPEG")), PathBuf::from("live.JPEG.tmp"));
    }

    #[test]
    fn test_rejects_non_jpeg_paths() {
        for name in ["live.png", "live", "live.jpg.bak"] {
            assert!(matches!(
                JpegFilePreview::new(name, DEFAULT_PREVIEW_SIZE),
                Err(PreviewError::UnsupportedFormat(_))
            ));
        }
        assert!(JpegFilePreview::new("Live.JPG", DEFAULT_PREVIEW_SIZE).is_ok());
        assert!(JpegFilePreview::new("live.jpeg", DEFAULT_PREVIEW_SIZE).is_ok());
    }
}
