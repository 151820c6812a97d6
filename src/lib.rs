//! termlayer overlays raster images on a terminal's character grid.
//!
//! Layers are named image slots positioned in cells. A [`Compositor`] tracks their state and
//! redraws through one [`RenderBackend`] only when something changed:
//!
//! - [`NativeBackend`] embeds X11 child windows under the terminal window
//! - [`ProcessBackend`] drives an external renderer (`ueberzug`) over line-delimited JSON
//!
//! Pick the backend once with [`create_backend`]; call sites never branch on its kind.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Layer registry and render scheduling.
pub mod compositor;
/// Decoding, pixel conversion and resampling.
pub mod pixel;
/// Render backends.
pub mod render;
/// Geometry of fitting an image into a box.
pub mod scale;

pub use crate::foundation::core::{CellRect, CellSize, Dimensions, Geometry, PixelRect};
pub use crate::foundation::error::{TermlayerError, TermlayerResult};

pub use crate::compositor::{Compositor, CompositorOpts, Layer, LayerPlacement};
pub use crate::pixel::buffer::PixelBuffer;
pub use crate::pixel::resize::ResampleFilter;
pub use crate::render::backend::{
    BackendKind, BackendSettings, DrawRequest, RenderBackend, create_backend,
};
pub use crate::render::native::{
    AnchorWindow, FixedGrid, NativeBackend, NativeBackendOpts, TerminalGrid,
};
pub use crate::render::process::{ErrorCallback, ProcessBackend, ProcessBackendOpts};
pub use crate::scale::policy::ScalePolicy;
pub use crate::scale::scaler::{place, scale};
