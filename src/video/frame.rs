use serde::{Deserialize, Serialize};

use crate::error::ClassificationError;

/// Encoding of a frame's pixel payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Packed 8-bit BGR, as delivered by most webcam pipelines
    Bgr24,
    /// Packed 8-bit RGB
    Rgb24,
    /// Compressed still (browser canvas snapshot)
    Jpeg,
    Png,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        match self {
            PixelFormat::Bgr24 | PixelFormat::Rgb24 => Some(3),
            PixelFormat::Jpeg | PixelFormat::Png => None,
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, PixelFormat::Jpeg | PixelFormat::Png)
    }
}

/// A single decoded video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Pixel payload in `format`
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Payload encoding
    pub format: PixelFormat,
    /// Timestamp in milliseconds since the connection started
    pub timestamp_ms: u64,
}

impl VideoFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat, timestamp_ms: u64) -> Self {
        Self {
            data,
            width,
            height,
            format,
            timestamp_ms,
        }
    }

    /// Payload size a raw frame of these dimensions must have
    ///
    /// `Ok(None)` for compressed formats; an error when the dimensions
    /// cannot describe an addressable buffer.
    pub fn expected_len(&self) -> Result<Option<usize>, ClassificationError> {
        let Some(bpp) = self.format.bytes_per_pixel() else {
            return Ok(None);
        };

        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(bpp))
            .map(Some)
            .ok_or_else(|| ClassificationError::InvalidInput {
                reason: format!("dimensions {}x{} are too large", self.width, self.height),
            })
    }

    /// Reject frames the classifier could not possibly use
    pub fn validate(&self) -> Result<(), ClassificationError> {
        if self.width == 0 || self.height == 0 {
            return Err(ClassificationError::InvalidInput {
                reason: format!("empty dimensions {}x{}", self.width, self.height),
            });
        }

        if self.data.is_empty() {
            return Err(ClassificationError::InvalidInput {
                reason: "empty payload".to_string(),
            });
        }

        if let Some(expected) = self.expected_len()? {
            if self.data.len() != expected {
                return Err(ClassificationError::InvalidInput {
                    reason: format!(
                        "expected {} bytes for {}x{} {:?}, got {}",
                        expected,
                        self.width,
                        self.height,
                        self.format,
                        self.data.len()
                    ),
                });
            }
        }

        Ok(())
    }
}
