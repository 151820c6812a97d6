use std::ops::Range;
use std::sync::Arc;

use crate::foundation::core::Dimensions;
use crate::foundation::error::{TermlayerError, TermlayerResult};

/// Bytes per BGRA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Raster in B,G,R,A byte order, row-major, top-left origin, tightly packed.
///
/// The byte array is shared: cloning a buffer is cheap and never copies pixels. Buffers are
/// immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Arc<Vec<u8>>,
}

impl PixelBuffer {
    /// Wrap BGRA bytes. `data.len()` must equal `4 * width * height`.
    pub fn from_bgra(width: u32, height: u32, data: Vec<u8>) -> TermlayerResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| TermlayerError::content(format!("image too large: {width}x{height}")))?;
        if data.len() != expected {
            return Err(TermlayerError::content(format!(
                "pixel buffer size mismatch: got {} bytes, expected {expected}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data: Arc::new(data),
        })
    }

    /// Caller guarantees `data.len() == stride * height`.
    pub(crate) fn from_parts(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * BYTES_PER_PIXEL,
            "pixel buffer length must match its extent"
        );
        Self {
            width,
            height,
            data: Arc::new(data),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Extent in pixels.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Bytes per row (`4 * width`).
    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// All pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes of the rows in `rows`, contiguous.
    pub fn rows(&self, rows: Range<u32>) -> &[u8] {
        let stride = self.stride();
        &self.data[rows.start as usize * stride..rows.end as usize * stride]
    }

    /// The BGRA quadruple at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let o = y as usize * self.stride() + x as usize * BYTES_PER_PIXEL;
        [
            self.data[o],
            self.data[o + 1],
            self.data[o + 2],
            self.data[o + 3],
        ]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pixel/buffer.rs"]
mod tests;
