use crate::foundation::core::{Dimensions, Geometry};
use crate::scale::policy::ScalePolicy;

/// Place an image of extent `image` inside a box of extent `window`.
///
/// Float results are truncated, so the output never exceeds the box because of rounding.
/// Callers must not pass a degenerate `window`; the result is meaningless (but does not panic).
pub fn place(image: Dimensions, window: Dimensions, policy: ScalePolicy) -> Dimensions {
    match policy {
        ScalePolicy::Crop | ScalePolicy::Cover => {
            Dimensions::new(image.w.min(window.w), image.h.min(window.h))
        }
        ScalePolicy::Distort | ScalePolicy::ForcedCover => window,
        ScalePolicy::ContainFit => contain(image, window, false),
        ScalePolicy::ContainFitUpscale => contain(image, window, true),
    }
}

/// Scale `geom.image` into `geom.window`.
///
/// The returned window is shrunk to the placed image, which is the extent a backend
/// materializes.
pub fn scale(geom: Geometry, policy: ScalePolicy) -> Geometry {
    let placed = place(geom.image, geom.window, policy);
    Geometry::new(placed, placed)
}

fn contain(image: Dimensions, window: Dimensions, upscale: bool) -> Dimensions {
    if !upscale && image.fits_in(window) {
        return image;
    }

    let ir = f64::from(image.w) / f64::from(image.h);
    let cr = f64::from(window.w) / f64::from(window.h);
    if ir > cr {
        let w = if upscale || image.w > window.w {
            window.w
        } else {
            image.w
        };
        return Dimensions::new(w, (f64::from(w) / ir) as u32);
    }

    let h = if upscale || image.h > window.h {
        window.h
    } else {
        image.h
    };
    Dimensions::new((f64::from(h) * ir) as u32, h)
}

#[cfg(test)]
#[path = "../../tests/unit/scale/scaler.rs"]
mod tests;
