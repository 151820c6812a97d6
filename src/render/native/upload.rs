use std::ops::Range;

use crate::foundation::error::{TermlayerError, TermlayerResult};
use crate::pixel::buffer::PixelBuffer;
use crate::render::native::server::{DisplayServer, GcId, PixmapId};

/// Consecutive row ranges that tile `[0, height)`, each fitting under a payload limit.
#[derive(Clone, Debug)]
pub(crate) struct RowBands {
    next: u32,
    height: u32,
    rows_per_band: u32,
}

impl RowBands {
    /// Plan bands of whole `stride`-byte rows, at most `max_payload` bytes each.
    pub(crate) fn new(height: u32, stride: usize, max_payload: usize) -> TermlayerResult<Self> {
        if stride == 0 {
            return Ok(Self {
                next: 0,
                height: 0,
                rows_per_band: 1,
            });
        }
        if stride > max_payload {
            return Err(TermlayerError::resource(format!(
                "a single {stride}-byte row exceeds the {max_payload}-byte transfer limit"
            )));
        }
        let rows = (max_payload / stride).min(height as usize).max(1);
        Ok(Self {
            next: 0,
            height,
            rows_per_band: rows as u32,
        })
    }
}

impl Iterator for RowBands {
    type Item = Range<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.height {
            return None;
        }
        let start = self.next;
        let end = start.saturating_add(self.rows_per_band).min(self.height);
        self.next = end;
        Some(start..end)
    }
}

/// Upload `buf` into `pixmap` as sequential row bands. Returns the number of transfers.
pub(crate) fn upload<S: DisplayServer + ?Sized>(
    server: &S,
    pixmap: PixmapId,
    gc: GcId,
    depth: u8,
    buf: &PixelBuffer,
) -> TermlayerResult<usize> {
    let mut transfers = 0;
    for rows in RowBands::new(buf.height(), buf.stride(), server.max_upload_bytes())? {
        server.put_image(pixmap, gc, depth, buf.width(), rows.clone(), buf.rows(rows))?;
        transfers += 1;
    }
    Ok(transfers)
}
