use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgba};
use serde::{Deserialize, Serialize};

use crate::foundation::core::Dimensions;
use crate::foundation::error::{TermlayerError, TermlayerResult};
use crate::pixel::buffer::PixelBuffer;

/// Resampling filter used when a source must be resized to its placed extent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    /// Nearest neighbor.
    Nearest,
    /// Bilinear interpolation.
    #[default]
    Bilinear,
}

impl From<ResampleFilter> for FilterType {
    fn from(f: ResampleFilter) -> Self {
        match f {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Bilinear => FilterType::Triangle,
        }
    }
}

/// Resample `src` into a newly allocated buffer of extent `target`.
///
/// Returns a cheap clone when `target` already equals the source extent.
pub fn resize(
    src: &PixelBuffer,
    target: Dimensions,
    filter: ResampleFilter,
) -> TermlayerResult<PixelBuffer> {
    if target == src.dimensions() {
        return Ok(src.clone());
    }
    if target.is_degenerate() || src.dimensions().is_degenerate() {
        return Err(TermlayerError::content(format!(
            "cannot resample {}x{} to {}x{}",
            src.width(),
            src.height(),
            target.w,
            target.h
        )));
    }

    // Channel order does not matter for resampling; BGRA is treated as four opaque lanes.
    let view = ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(src.width(), src.height(), src.data())
        .ok_or_else(|| TermlayerError::content("pixel buffer does not match its extent"))?;
    let out = imageops::resize(&view, target.w, target.h, filter.into());
    Ok(PixelBuffer::from_parts(target.w, target.h, out.into_raw()))
}

#[cfg(test)]
#[path = "../../tests/unit/pixel/resize.rs"]
mod tests;
