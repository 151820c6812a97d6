//! Conversion of decoded rasters into [`PixelBuffer`]s.
//!
//! Each known representation has a dedicated row loop; everything else goes through
//! [`convert_generic`]. Rows are converted in parallel.

use image::{DynamicImage, GenericImageView};
use rayon::prelude::*;

use crate::foundation::core::Dimensions;
use crate::pixel::buffer::{BYTES_PER_PIXEL, PixelBuffer};
use crate::pixel::source::{PlanarYCbCr, SourceImage};

/// Convert any supported source into BGRA.
pub fn convert(src: &SourceImage) -> PixelBuffer {
    let dims = src.dimensions();
    match src {
        SourceImage::Rgba8(img) => {
            let raw = img.as_raw();
            fill_rows(dims, |y, row| {
                for (d, s) in row
                    .chunks_exact_mut(4)
                    .zip(src_row(raw, y, dims.w, 4).chunks_exact(4))
                {
                    let a = s[3];
                    d[0] = weight(a, s[2]);
                    d[1] = weight(a, s[1]);
                    d[2] = weight(a, s[0]);
                    d[3] = a;
                }
            })
        }
        SourceImage::Rgba8Premul(img) => {
            let raw = img.as_raw();
            fill_rows(dims, |y, row| {
                for (d, s) in row
                    .chunks_exact_mut(4)
                    .zip(src_row(raw, y, dims.w, 4).chunks_exact(4))
                {
                    d.copy_from_slice(&[s[2], s[1], s[0], s[3]]);
                }
            })
        }
        SourceImage::Rgba16(img) => {
            let raw = img.as_raw();
            fill_rows(dims, |y, row| {
                for (d, s) in row
                    .chunks_exact_mut(4)
                    .zip(src_row(raw, y, dims.w, 4).chunks_exact(4))
                {
                    let a = high_byte(s[3]);
                    d[0] = weight(a, high_byte(s[2]));
                    d[1] = weight(a, high_byte(s[1]));
                    d[2] = weight(a, high_byte(s[0]));
                    d[3] = a;
                }
            })
        }
        SourceImage::Rgba16Premul(img) => {
            let raw = img.as_raw();
            fill_rows(dims, |y, row| {
                for (d, s) in row
                    .chunks_exact_mut(4)
                    .zip(src_row(raw, y, dims.w, 4).chunks_exact(4))
                {
                    d[0] = high_byte(s[2]);
                    d[1] = high_byte(s[1]);
                    d[2] = high_byte(s[0]);
                    d[3] = high_byte(s[3]);
                }
            })
        }
        SourceImage::Rgb8(img) => {
            let raw = img.as_raw();
            fill_rows(dims, |y, row| {
                for (d, s) in row
                    .chunks_exact_mut(4)
                    .zip(src_row(raw, y, dims.w, 3).chunks_exact(3))
                {
                    d.copy_from_slice(&[s[2], s[1], s[0], 255]);
                }
            })
        }
        SourceImage::Luma8(img) => {
            let raw = img.as_raw();
            fill_rows(dims, |y, row| {
                for (d, &v) in row.chunks_exact_mut(4).zip(src_row(raw, y, dims.w, 1)) {
                    d.copy_from_slice(&[v, v, v, 255]);
                }
            })
        }
        SourceImage::Luma16(img) => {
            let raw = img.as_raw();
            fill_rows(dims, |y, row| {
                for (d, &v) in row.chunks_exact_mut(4).zip(src_row(raw, y, dims.w, 1)) {
                    let v = high_byte(v);
                    d.copy_from_slice(&[v, v, v, 255]);
                }
            })
        }
        SourceImage::YCbCr(img) => convert_ycbcr(img),
        SourceImage::Other(img) => convert_generic(img),
    }
}

/// Per-pixel fallback through `image`'s color model.
///
/// Produces the same bytes as the straight-alpha fast paths for 8-bit RGBA input.
pub fn convert_generic(img: &DynamicImage) -> PixelBuffer {
    let dims = Dimensions::new(img.width(), img.height());
    fill_rows(dims, |y, row| {
        for (x, d) in row.chunks_exact_mut(4).enumerate() {
            let [r, g, b, a] = img.get_pixel(x as u32, y).0;
            d[0] = weight(a, b);
            d[1] = weight(a, g);
            d[2] = weight(a, r);
            d[3] = a;
        }
    })
}

fn convert_ycbcr(img: &PlanarYCbCr) -> PixelBuffer {
    let dims = Dimensions::new(img.width, img.height);
    fill_rows(dims, |y, row| {
        let luma = src_row(&img.y, y, dims.w, 1);
        for (x, d) in row.chunks_exact_mut(4).enumerate() {
            let co = img.chroma_offset(x as u32, y);
            let yv = f32::from(luma[x]);
            let cb = f32::from(img.cb[co]) - 128.0;
            let cr = f32::from(img.cr[co]) - 128.0;
            let r = yv + 1.402 * cr;
            let g = yv - 0.344_136 * cb - 0.714_136 * cr;
            let b = yv + 1.772 * cb;
            d.copy_from_slice(&[clamp_u8(b), clamp_u8(g), clamp_u8(r), 255]);
        }
    })
}

/// Scale a straight-alpha channel by its alpha: `alpha * (c << 8) / 0xFFFF`.
#[inline]
fn weight(alpha: u8, c: u8) -> u8 {
    ((u32::from(alpha) * (u32::from(c) << 8)) / 0xFFFF) as u8
}

#[inline]
fn high_byte(v: u16) -> u8 {
    (v >> 8) as u8
}

#[inline]
fn clamp_u8(v: f32) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

fn src_row<T>(raw: &[T], y: u32, width: u32, channels: usize) -> &[T] {
    let stride = width as usize * channels;
    &raw[y as usize * stride..(y as usize + 1) * stride]
}

fn fill_rows(dims: Dimensions, f: impl Fn(u32, &mut [u8]) + Sync) -> PixelBuffer {
    let stride = dims.w as usize * BYTES_PER_PIXEL;
    let mut data = vec![0u8; stride * dims.h as usize];
    if stride > 0 {
        data.par_chunks_exact_mut(stride)
            .enumerate()
            .for_each(|(y, row)| f(y as u32, row));
    }
    PixelBuffer::from_parts(dims.w, dims.h, data)
}

#[cfg(test)]
#[path = "../../tests/unit/pixel/convert.rs"]
mod tests;
