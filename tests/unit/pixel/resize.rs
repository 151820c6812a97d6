use super::*;

fn checker(w: u32, h: u32) -> PixelBuffer {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            let v = if (x + y) % 2 == 0 { 255 } else { 0 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    PixelBuffer::from_bgra(w, h, data).unwrap()
}

#[test]
fn same_extent_shares_pixels() {
    let src = checker(4, 4);
    let out = resize(&src, Dimensions::new(4, 4), ResampleFilter::Bilinear).unwrap();
    assert_eq!(out, src);
}

#[test]
fn nearest_upscale_replicates_pixels() {
    let src = checker(2, 1);
    let out = resize(&src, Dimensions::new(4, 2), ResampleFilter::Nearest).unwrap();
    assert_eq!(out.dimensions(), Dimensions::new(4, 2));
    assert_eq!(out.stride(), 16);
    assert_eq!(out.pixel(0, 0), [255, 255, 255, 255]);
    assert_eq!(out.pixel(1, 1), [255, 255, 255, 255]);
    assert_eq!(out.pixel(3, 0), [0, 0, 0, 255]);
}

#[test]
fn bilinear_downscale_allocates_target_extent() {
    let src = checker(64, 32);
    let out = resize(&src, Dimensions::new(16, 8), ResampleFilter::Bilinear).unwrap();
    assert_eq!(out.data().len(), 16 * 8 * 4);
    assert!(out.data().chunks_exact(4).all(|p| p[3] == 255));
}

#[test]
fn degenerate_target_is_rejected() {
    let src = checker(2, 2);
    assert!(resize(&src, Dimensions::new(0, 2), ResampleFilter::Nearest).is_err());
}
