use image::{DynamicImage, GrayImage, ImageBuffer, Luma, RgbImage, Rgba, RgbaImage};

use crate::foundation::core::Dimensions;
use crate::foundation::error::{TermlayerError, TermlayerResult};

/// 16-bit RGBA raster.
pub type Rgba16Image = ImageBuffer<Rgba<u16>, Vec<u16>>;
/// 16-bit grayscale raster.
pub type Gray16Image = ImageBuffer<Luma<u16>, Vec<u16>>;

/// A decoded raster in one of the representations the converters know.
///
/// Variants without a dedicated fast path are carried as [`SourceImage::Other`].
#[derive(Clone, Debug)]
pub enum SourceImage {
    /// 8-bit RGBA, straight (non-premultiplied) alpha.
    Rgba8(RgbaImage),
    /// 8-bit RGBA whose color channels are already weighted by alpha.
    Rgba8Premul(RgbaImage),
    /// 16-bit RGBA, straight alpha.
    Rgba16(Rgba16Image),
    /// 16-bit RGBA, premultiplied.
    Rgba16Premul(Rgba16Image),
    /// 8-bit RGB, opaque.
    Rgb8(RgbImage),
    /// 8-bit grayscale.
    Luma8(GrayImage),
    /// 16-bit grayscale.
    Luma16(Gray16Image),
    /// Planar Y'CbCr as produced by video and JPEG decoders.
    YCbCr(PlanarYCbCr),
    /// Anything else; converted through the generic per-pixel path.
    Other(DynamicImage),
}

impl SourceImage {
    /// Extent in pixels.
    pub fn dimensions(&self) -> Dimensions {
        let (w, h) = match self {
            Self::Rgba8(img) | Self::Rgba8Premul(img) => img.dimensions(),
            Self::Rgba16(img) | Self::Rgba16Premul(img) => img.dimensions(),
            Self::Rgb8(img) => img.dimensions(),
            Self::Luma8(img) => img.dimensions(),
            Self::Luma16(img) => img.dimensions(),
            Self::YCbCr(img) => (img.width, img.height),
            Self::Other(img) => (img.width(), img.height()),
        };
        Dimensions::new(w, h)
    }
}

impl From<DynamicImage> for SourceImage {
    fn from(img: DynamicImage) -> Self {
        match img {
            DynamicImage::ImageRgba8(img) => Self::Rgba8(img),
            DynamicImage::ImageRgba16(img) => Self::Rgba16(img),
            DynamicImage::ImageRgb8(img) => Self::Rgb8(img),
            DynamicImage::ImageLuma8(img) => Self::Luma8(img),
            DynamicImage::ImageLuma16(img) => Self::Luma16(img),
            other => Self::Other(other),
        }
    }
}

/// Chroma plane layout relative to the luma plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChromaSubsampling {
    /// Full resolution chroma.
    Yuv444,
    /// Half horizontal resolution.
    Yuv422,
    /// Half horizontal and vertical resolution.
    Yuv420,
}

impl ChromaSubsampling {
    fn divisors(self) -> (u32, u32) {
        match self {
            Self::Yuv444 => (1, 1),
            Self::Yuv422 => (2, 1),
            Self::Yuv420 => (2, 2),
        }
    }
}

/// Planar Y'CbCr with tightly packed planes.
#[derive(Clone, Debug)]
pub struct PlanarYCbCr {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) y: Vec<u8>,
    pub(crate) cb: Vec<u8>,
    pub(crate) cr: Vec<u8>,
    pub(crate) subsampling: ChromaSubsampling,
}

impl PlanarYCbCr {
    /// Build from planes, validating their lengths against the subsampling.
    pub fn new(
        width: u32,
        height: u32,
        subsampling: ChromaSubsampling,
        y: Vec<u8>,
        cb: Vec<u8>,
        cr: Vec<u8>,
    ) -> TermlayerResult<Self> {
        let luma_len = width as usize * height as usize;
        if y.len() != luma_len {
            return Err(TermlayerError::content(format!(
                "luma plane has {} bytes, expected {luma_len}",
                y.len()
            )));
        }
        let (cw, ch) = chroma_extent(width, height, subsampling);
        let chroma_len = cw as usize * ch as usize;
        if cb.len() != chroma_len || cr.len() != chroma_len {
            return Err(TermlayerError::content(format!(
                "chroma planes have {}/{} bytes, expected {chroma_len}",
                cb.len(),
                cr.len()
            )));
        }
        Ok(Self {
            width,
            height,
            y,
            cb,
            cr,
            subsampling,
        })
    }

    pub(crate) fn chroma_stride(&self) -> usize {
        chroma_extent(self.width, self.height, self.subsampling).0 as usize
    }

    pub(crate) fn chroma_offset(&self, x: u32, y: u32) -> usize {
        let (dx, dy) = self.subsampling.divisors();
        (y / dy) as usize * self.chroma_stride() + (x / dx) as usize
    }
}

fn chroma_extent(width: u32, height: u32, subsampling: ChromaSubsampling) -> (u32, u32) {
    let (dx, dy) = subsampling.divisors();
    (width.div_ceil(dx), height.div_ceil(dy))
}
