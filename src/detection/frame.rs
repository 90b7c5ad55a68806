use chrono::{DateTime, Utc};

use crate::error::{ProctorError, ProctorResult};

/// One captured video frame (8-bit RGBA, row-major)
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Raw pixels, 4 bytes per pixel
    pub rgba: Vec<u8>,
    /// When the frame was captured
    pub timestamp: DateTime<Utc>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba,
            timestamp: Utc::now(),
        }
    }

    /// Build a frame where every pixel has the same color
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = (width as usize) * (height as usize);
        let mut rgba = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            rgba.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        Self::new(width, height, rgba)
    }

    /// Reject frames the analyzer cannot safely index into
    pub fn validate(&self) -> ProctorResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ProctorError::Detection(format!(
                "zero-dimension frame ({}x{})",
                self.width, self.height
            )));
        }

        let expected = (self.width as usize) * (self.height as usize) * 4;
        if self.rgba.len() < expected {
            return Err(ProctorError::Detection(format!(
                "frame buffer too short: {} bytes for {}x{} (expected {})",
                self.rgba.len(),
                self.width,
                self.height,
                expected
            )));
        }

        Ok(())
    }

    /// RGB of the pixel at (x, y). Caller guarantees bounds.
    pub(crate) fn rgb_at(&self, x: u32, y: u32) -> (f64, f64, f64) {
        let index = ((y as usize) * (self.width as usize) + x as usize) * 4;
        (
            self.rgba[index] as f64,
            self.rgba[index + 1] as f64,
            self.rgba[index + 2] as f64,
        )
    }
}
