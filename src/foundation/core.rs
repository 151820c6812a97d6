use crate::foundation::error::{TermlayerError, TermlayerResult};

/// Width/height pair in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dimensions {
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
}

impl Dimensions {
    /// Create a new dimension pair.
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    /// Return `true` when either axis is zero.
    pub fn is_degenerate(self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Return `true` when `self` fits inside `other` on both axes.
    pub fn fits_in(self, other: Self) -> bool {
        self.w <= other.w && self.h <= other.h
    }
}

/// Scaler input/output: the image extent and the window box it is placed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Geometry {
    /// Image extent in pixels.
    pub image: Dimensions,
    /// Window extent in pixels.
    pub window: Dimensions,
}

impl Geometry {
    /// Create a geometry from image and window extents.
    pub const fn new(image: Dimensions, window: Dimensions) -> Self {
        Self { image, window }
    }
}

/// Pixel size of one terminal character cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellSize {
    /// Cell width in pixels.
    pub w: u32,
    /// Cell height in pixels.
    pub h: u32,
}

impl CellSize {
    /// Create a validated cell size. Both axes must be non-zero.
    pub fn new(w: u32, h: u32) -> TermlayerResult<Self> {
        if w == 0 || h == 0 {
            return Err(TermlayerError::config(format!(
                "character cell size must be non-zero, got {w}x{h}"
            )));
        }
        Ok(Self { w, h })
    }
}

/// Rectangle on the terminal grid, in columns and lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellRect {
    /// Left column.
    pub x: i32,
    /// Top line.
    pub y: i32,
    /// Width in columns.
    pub width: u32,
    /// Height in lines.
    pub height: u32,
}

impl CellRect {
    /// Convert to pixels using `cell`.
    pub fn to_pixels(self, cell: CellSize) -> PixelRect {
        PixelRect {
            x: self.x.saturating_mul(cell.w as i32),
            y: self.y.saturating_mul(cell.h as i32),
            width: self.width.saturating_mul(cell.w),
            height: self.height.saturating_mul(cell.h),
        }
    }
}

/// Rectangle in pixels relative to the anchor window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PixelRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl PixelRect {
    /// Size of the rectangle.
    pub fn size(self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Convert to whole cells, truncating partial cells.
    pub fn to_cells(self, cell: CellSize) -> CellRect {
        CellRect {
            x: self.x / cell.w as i32,
            y: self.y / cell.h as i32,
            width: self.width / cell.w,
            height: self.height / cell.h,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
