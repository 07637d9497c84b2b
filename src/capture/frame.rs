//! Frame handle for camera images

use parking_lot::Mutex;
use std::fmt;
use std::time::Instant;

type ReleaseFn = Box<dyn FnOnce() + Send>;

/// A single-use camera frame.
///
/// The camera pipeline hands the frame over together with a release callback.
/// The callback runs exactly once, when the frame is dropped, so every exit
/// path of the analysis gives the buffer back.
pub struct Frame {
    /// Monotonic frame number assigned by the producer
    pub sequence: u64,
    /// Frame width in pixels (sensor orientation)
    pub width: u32,
    /// Frame height in pixels (sensor orientation)
    pub height: u32,
    /// Clockwise rotation needed to display the frame upright
    pub rotation_degrees: u16,
    /// Raw pixel data, format defined by the producer
    pub data: Vec<u8>,
    /// Timestamp when the frame was captured
    pub captured_at: Instant,
    release: Mutex<Option<ReleaseFn>>,
}

impl Frame {
    /// Create a frame with no pixel data and no release callback
    pub fn new(sequence: u64, width: u32, height: u32, rotation_degrees: u16) -> Self {
        Self {
            sequence,
            width,
            height,
            rotation_degrees,
            data: Vec::new(),
            captured_at: Instant::now(),
            release: Mutex::new(None),
        }
    }

    /// Attach pixel data
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// Attach the callback that hands the buffer back to the camera
    pub fn on_release<F>(mut self, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        *self.release.get_mut() = Some(Box::new(release));
        self
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Dimensions of the upright image, which is the space detectors report
    /// bounding boxes in. Width and height swap for quarter turns.
    pub fn upright_dimensions(&self) -> (u32, u32) {
        match self.rotation_degrees % 360 {
            90 | 270 => (self.height, self.width),
            _ => (self.width, self.height),
        }
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        if let Some(release) = self.release.get_mut().take() {
            release();
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("sequence", &self.sequence)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rotation_degrees", &self.rotation_degrees)
            .field("data_len", &self.data.len())
            .finish()
    }
}
