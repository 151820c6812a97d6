use std::fs::Metadata;
use std::path::Path;

use crate::foundation::core::Dimensions;
use crate::foundation::error::{TermlayerError, TermlayerResult};
use crate::pixel::source::SourceImage;

/// Decode an encoded image (PNG, JPEG, GIF, BMP, WebP, ...) from memory.
pub fn decode(bytes: &[u8]) -> TermlayerResult<SourceImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| TermlayerError::content(format!("decode image: {e}")))?;
    Ok(SourceImage::from(img))
}

/// Read and decode the image at `path`.
pub fn decode_file(path: &Path) -> TermlayerResult<SourceImage> {
    check_source_path(path)?;
    let bytes = std::fs::read(path)
        .map_err(|e| TermlayerError::content(format!("read '{}': {e}", path.display())))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| TermlayerError::content(format!("decode '{}': {e}", path.display())))?;
    Ok(SourceImage::from(img))
}

/// Read the pixel extent from the image header without decoding pixels.
pub fn image_dimensions(path: &Path) -> TermlayerResult<Dimensions> {
    check_source_path(path)?;
    let (w, h) = image::image_dimensions(path)
        .map_err(|e| TermlayerError::content(format!("'{}': {e}", path.display())))?;
    Ok(Dimensions::new(w, h))
}

/// Ensure `path` names a readable regular file.
pub fn check_source_path(path: &Path) -> TermlayerResult<Metadata> {
    let meta = std::fs::metadata(path)
        .map_err(|e| TermlayerError::content(format!("'{}': {e}", path.display())))?;
    if meta.is_dir() {
        return Err(TermlayerError::content(format!(
            "'{}' is a directory",
            path.display()
        )));
    }
    Ok(meta)
}

#[cfg(test)]
#[path = "../../tests/unit/pixel/decode.rs"]
mod tests;
