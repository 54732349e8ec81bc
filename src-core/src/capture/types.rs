//! Pixel buffers passed between the capture, conversion and encoding stages.

use super::error::CaptureError;
use screenrec_types::Geometry;

/// Bytes per pixel of a captured BGRA frame.
pub const BGRA_CHANNELS: usize = 4;

/// Bytes per pixel of a BGR color buffer.
pub const BGR_CHANNELS: usize = 3;

/// A captured frame with its dimensions and pixel data.
#[derive(Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// BGRA pixel data, rows tightly packed
    pub data: Vec<u8>,
}

impl Frame {
    /// Wrap a BGRA buffer, checking that it covers `width`x`height`.
    pub fn from_bgra(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CaptureError> {
        let expected = width as usize * height as usize * BGRA_CHANNELS;
        if width == 0 || height == 0 || data.len() != expected {
            return Err(CaptureError::InvalidFrame(format!(
                "{}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a BGRA frame from RGBA data by swapping the R and B channels in place.
    pub fn from_rgba(width: u32, height: u32, mut data: Vec<u8>) -> Result<Self, CaptureError> {
        for px in data.chunks_exact_mut(BGRA_CHANNELS) {
            px.swap(0, 2);
        }
        Self::from_bgra(width, height, data)
    }

    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.width, self.height)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Three-channel BGR pixel buffer, the encoder's input format.
#[derive(Clone, PartialEq, Eq)]
pub struct ColorBuffer {
    pub width: u32,
    pub height: u32,
    /// BGR pixel data, rows tightly packed
    pub data: Vec<u8>,
}

impl ColorBuffer {
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.width, self.height)
    }

    /// Number of interleaved channels per pixel.
    pub fn channels(&self) -> usize {
        if self.width == 0 || self.height == 0 {
            return BGR_CHANNELS;
        }
        self.data.len() / (self.width as usize * self.height as usize)
    }
}

impl std::fmt::Debug for ColorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bgra_checks_length() {
        assert!(Frame::from_bgra(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            Frame::from_bgra(2, 2, vec![0; 15]),
            Err(CaptureError::InvalidFrame(_))
        ));
        assert!(Frame::from_bgra(0, 2, Vec::new()).is_err());
    }

    #[test]
    fn test_from_rgba_swaps_red_and_blue() {
        let frame = Frame::from_rgba(1, 1, vec![10, 20, 30, 255]).unwrap();
        assert_eq!(frame.data, vec![30, 20, 10, 255]);
    }
}
