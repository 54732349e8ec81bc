//! Synthetic sources, sinks and previews that record every call.

use crate::capture::{CaptureError, ColorBuffer, Frame, FrameSource};
use crate::encoder::{check_geometry, EncoderBackend, EncoderError, EncoderTarget, FrameSink};
use crate::preview::{PreviewError, PreviewSurface};
use screenrec_types::{AspectMode, Geometry};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Produces solid frames, cycling through `sizes` (the last size repeats).
pub struct SyntheticSource {
    sizes: Vec<Geometry>,
    fail_next: u32,
    cache: HashMap<Geometry, Frame>,
    pub captured: usize,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_sizes(vec![Geometry::new(width, height)])
    }

    pub fn with_sizes(sizes: Vec<Geometry>) -> Self {
        Self {
            sizes,
            fail_next: 0,
            cache: HashMap::new(),
            captured: 0,
        }
    }

    /// Make the next `n` captures fail.
    pub fn fail_next(&mut self, n: u32) {
        self.fail_next = n;
    }
}

impl FrameSource for SyntheticSource {
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(CaptureError::PlatformError("display unavailable".to_string()));
        }
        let index = self.captured.min(self.sizes.len() - 1);
        let size = self.sizes[index];
        self.captured += 1;
        let frame = self.cache.entry(size).or_insert_with(|| {
            let data = [40u8, 80, 120, 255].repeat(size.pixel_count());
            Frame {
                width: size.width,
                height: size.height,
                data,
            }
        });
        Ok(frame.clone())
    }
}

/// Every call made against a [`RecordingBackend`] and its sinks.
#[derive(Debug, Default)]
pub struct EncoderLog {
    pub opened: Vec<EncoderTarget>,
    pub written: Vec<Geometry>,
    pub closed: usize,
}

#[derive(Default)]
pub struct RecordingBackend {
    pub log: Rc<RefCell<EncoderLog>>,
    pub fail_open: bool,
    /// Fail the write with this 1-based index.
    pub fail_write_at: Option<u64>,
}

impl RecordingBackend {
    pub fn new() -> (Self, Rc<RefCell<EncoderLog>>) {
        let backend = Self::default();
        let log = backend.log.clone();
        (backend, log)
    }
}

impl EncoderBackend for RecordingBackend {
    type Sink = RecordingSink;

    fn open(&mut self, target: &EncoderTarget) -> Result<RecordingSink, EncoderError> {
        if self.fail_open {
            return Err(EncoderError::CannotOpen("codec not installed".to_string()));
        }
        self.log.borrow_mut().opened.push(target.clone());
        Ok(RecordingSink {
            log: self.log.clone(),
            geometry: target.geometry,
            writes: 0,
            fail_write_at: self.fail_write_at,
            closed: false,
        })
    }
}

pub struct RecordingSink {
    log: Rc<RefCell<EncoderLog>>,
    geometry: Geometry,
    writes: u64,
    fail_write_at: Option<u64>,
    closed: bool,
}

impl FrameSink for RecordingSink {
    fn write_frame(&mut self, buffer: &ColorBuffer) -> Result<(), EncoderError> {
        check_geometry(self.geometry, buffer)?;
        self.writes += 1;
        if self.fail_write_at == Some(self.writes) {
            return Err(EncoderError::WriteFailed("broken pipe".to_string()));
        }
        self.log.borrow_mut().written.push(buffer.geometry());
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.log.borrow_mut().closed += 1;
        }
    }
}

/// Counts presented frames.
#[derive(Default)]
pub struct CountingPreview {
    pub presented: Rc<Cell<usize>>,
    pub last_aspect: Rc<Cell<Option<AspectMode>>>,
}

impl PreviewSurface for CountingPreview {
    fn present(&mut self, _frame: &Frame, aspect: AspectMode) -> Result<(), PreviewError> {
        self.presented.set(self.presented.get() + 1);
        self.last_aspect.set(Some(aspect));
        Ok(())
    }
}
