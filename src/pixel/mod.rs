//! Raster representation, decoding, conversion and resampling.

/// The BGRA buffer handed to backends.
pub mod buffer;
/// Fast-path and generic conversion into BGRA.
pub mod convert;
/// Decoding from bytes and files.
pub mod decode;
/// Resampling to placed extents.
pub mod resize;
/// Decoded source representations.
pub mod source;
