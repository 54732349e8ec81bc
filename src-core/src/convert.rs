//! Pixel conversion from captured BGRA frames to encoder-ready BGR buffers.
//!
//! Alpha is dropped first, then the three-byte pixels are downscaled with a
//! box convolution, which averages the source pixels under each output pixel.
//! Channel order is irrelevant to the resizer, so BGR stays BGR.

use crate::capture::{CaptureError, ColorBuffer, Frame, BGRA_CHANNELS, BGR_CHANNELS};
use fast_image_resize::images::{Image, ImageRef};
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use screenrec_types::{Geometry, ScaleFactor};

/// Converts frames for the encoder, reusing the resizer's scratch buffers.
pub struct PixelConverter {
    resizer: Resizer,
    options: ResizeOptions,
}

impl Default for PixelConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelConverter {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Box)),
        }
    }

    /// Convert a captured frame for encoding, downscaling it by `scale`.
    ///
    /// Output dimensions are `floor(W / d)` x `floor(H / d)` for the scale's divisor `d`.
    pub fn convert(&mut self, frame: &Frame, scale: ScaleFactor) -> Result<ColorBuffer, CaptureError> {
        let buffer = ColorBuffer {
            width: frame.width,
            height: frame.height,
            data: drop_alpha(&frame.data),
        };
        self.resize(buffer, scale.apply(frame.width, frame.height))
    }

    /// Resize a BGR buffer to `geometry`. Returns it unchanged when it already fits.
    pub fn resize(
        &mut self,
        buffer: ColorBuffer,
        geometry: Geometry,
    ) -> Result<ColorBuffer, CaptureError> {
        if buffer.geometry() == geometry {
            return Ok(buffer);
        }

        let src = ImageRef::new(buffer.width, buffer.height, &buffer.data, PixelType::U8x3)
            .map_err(|e| CaptureError::InvalidFrame(e.to_string()))?;
        let mut dst = Image::new(geometry.width, geometry.height, PixelType::U8x3);
        self.resizer
            .resize(&src, &mut dst, &self.options)
            .map_err(|e| CaptureError::InvalidFrame(e.to_string()))?;

        Ok(ColorBuffer {
            width: geometry.width,
            height: geometry.height,
            data: dst.into_vec(),
        })
    }
}

/// Strip the alpha byte from tightly packed BGRA pixels.
fn drop_alpha(bgra: &[u8]) -> Vec<u8> {
    let mut bgr = Vec::with_capacity(bgra.len() / BGRA_CHANNELS * BGR_CHANNELS);
    for px in bgra.chunks_exact(BGRA_CHANNELS) {
        bgr.extend_from_slice(&px[..BGR_CHANNELS]);
    }
    bgr
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32, bgra: [u8; 4]) -> Frame {
        let data = bgra.repeat((width * height) as usize);
        Frame::from_bgra(width, height, data).unwrap()
    }

    fn assert_solid(buffer: &ColorBuffer, bgr: [u8; 3]) {
        for px in buffer.data.chunks_exact(3) {
            for (got, want) in px.iter().zip(bgr) {
                assert!(got.abs_diff(want) <= 1, "{:?} != {:?}", px, bgr);
            }
        }
    }

    #[test]
    fn test_output_geometry_for_every_scale() {
        let mut converter = PixelConverter::new();
        for (w, h) in [(1920, 1080), (1366, 768), (1001, 7), (5, 3)] {
            let frame = solid_frame(w, h, [1, 2, 3, 255]);
            for scale in ScaleFactor::ALL {
                let out = converter.convert(&frame, scale).unwrap();
                let d = scale.divisor();
                assert_eq!(out.width, (w / d).max(1), "{}x{} at {}", w, h, scale);
                assert_eq!(out.height, (h / d).max(1), "{}x{} at {}", w, h, scale);
                assert_eq!(out.channels(), 3);
                assert_eq!(out.data.len(), out.width as usize * out.height as usize * 3);
            }
        }
    }

    #[test]
    fn test_drops_alpha_without_reordering() {
        let frame = Frame::from_bgra(2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let out = PixelConverter::new()
            .convert(&frame, ScaleFactor::Original)
            .unwrap();
        assert_eq!(out.data, vec![1, 2, 3, 5, 6, 7]);
    }

    #[test]
    fn test_half_scale_averages_blocks() {
        // 2x2 block with blue channel 10, 20, 30, 40
        let data = vec![
            10, 0, 0, 255, 20, 0, 0, 255, //
            30, 0, 0, 255, 40, 0, 0, 255,
        ];
        let frame = Frame::from_bgra(2, 2, data).unwrap();
        let out = PixelConverter::new().convert(&frame, ScaleFactor::Half).unwrap();
        assert_eq!((out.width, out.height), (1, 1));
        assert_eq!(out.data, vec![25, 0, 0]);
    }

    #[test]
    fn test_solid_color_survives_fractional_ratio() {
        let frame = solid_frame(7, 5, [200, 100, 50, 255]);
        let out = PixelConverter::new().convert(&frame, ScaleFactor::Third).unwrap();
        assert_eq!((out.width, out.height), (2, 1));
        assert_solid(&out, [200, 100, 50]);
    }

    #[test]
    fn test_convert_is_deterministic() {
        let data: Vec<u8> = (0..64u32 * 48 * 4).map(|i| (i * 31 % 251) as u8).collect();
        let frame = Frame::from_bgra(64, 48, data).unwrap();
        let mut converter = PixelConverter::new();
        let a = converter.convert(&frame, ScaleFactor::Third).unwrap();
        let b = converter.convert(&frame, ScaleFactor::Third).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_resize_up_and_down() {
        let mut converter = PixelConverter::new();
        let buffer = ColorBuffer {
            width: 4,
            height: 2,
            data: [9u8, 8, 7].repeat(8),
        };
        let down = converter.resize(buffer.clone(), Geometry::new(2, 1)).unwrap();
        assert_eq!(down.geometry(), Geometry::new(2, 1));
        assert_solid(&down, [9, 8, 7]);

        let up = converter.resize(buffer, Geometry::new(6, 3)).unwrap();
        assert_eq!(up.geometry(), Geometry::new(6, 3));
        assert_eq!(up.data.len(), 6 * 3 * 3);
        assert_solid(&up, [9, 8, 7]);
    }

    #[test]
    fn test_resize_same_geometry_is_unchanged() {
        let buffer = ColorBuffer {
            width: 1,
            height: 1,
            data: vec![1, 2, 3],
        };
        let out = PixelConverter::new()
            .resize(buffer.clone(), Geometry::new(1, 1))
            .unwrap();
        assert_eq!(out, buffer);
    }

    #[test]
    fn test_resize_rejects_short_buffer() {
        let buffer = ColorBuffer {
            width: 4,
            height: 4,
            data: vec![0; 5],
        };
        assert!(matches!(
            PixelConverter::new().resize(buffer, Geometry::new(2, 2)),
            Err(CaptureError::InvalidFrame(_))
        ));
    }
}
