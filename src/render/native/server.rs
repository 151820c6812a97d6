use std::ops::Range;

use crate::foundation::core::{Dimensions, PixelRect};
use crate::foundation::error::TermlayerResult;

/// Server-side window handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowId(pub u32);

/// Server-side pixmap handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixmapId(pub u32);

/// Server-side graphics context handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GcId(pub u32);

/// Color depth and visual of the default screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenFormat {
    /// Bits per pixel of drawables created on the screen.
    pub depth: u8,
    /// Visual id used for created windows.
    pub visual: u32,
}

/// Server notifications the native backend reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerEvent {
    /// Part of `window` needs repainting.
    Expose {
        /// Window that was exposed.
        window: WindowId,
    },
    /// Anything the backend does not handle.
    Other,
}

/// The windowing-protocol calls the native backend is built on.
///
/// Resource creation is expected to be checked: a returned handle refers to a resource that
/// exists on the server.
pub trait DisplayServer: Send + Sync {
    /// Depth and visual of the default screen.
    fn screen_format(&self) -> TermlayerResult<ScreenFormat>;
    /// Maximum pixel payload of one image transfer, in bytes.
    fn max_upload_bytes(&self) -> usize;

    /// Create an unmapped child of `parent` that reports exposure.
    fn create_window(
        &self,
        parent: WindowId,
        format: ScreenFormat,
        rect: PixelRect,
    ) -> TermlayerResult<WindowId>;
    /// Create an off-screen pixmap on the same screen as `window`.
    fn create_pixmap(
        &self,
        format: ScreenFormat,
        window: WindowId,
        size: Dimensions,
    ) -> TermlayerResult<PixmapId>;
    /// Create a graphics context for drawing into `pixmap`.
    fn create_gc(&self, pixmap: PixmapId) -> TermlayerResult<GcId>;

    /// Write full-width BGRA rows `rows` of an image `width` pixels wide into `pixmap`.
    fn put_image(
        &self,
        pixmap: PixmapId,
        gc: GcId,
        depth: u8,
        width: u32,
        rows: Range<u32>,
        data: &[u8],
    ) -> TermlayerResult<()>;
    /// Copy the top-left `size` of `src` onto `dst`.
    fn copy_area(
        &self,
        src: PixmapId,
        dst: WindowId,
        gc: GcId,
        size: Dimensions,
    ) -> TermlayerResult<()>;

    /// Move `window` relative to its parent.
    fn move_window(&self, window: WindowId, x: i32, y: i32) -> TermlayerResult<()>;
    /// Show `window`.
    fn map_window(&self, window: WindowId) -> TermlayerResult<()>;
    /// Hide `window`.
    fn unmap_window(&self, window: WindowId) -> TermlayerResult<()>;
    /// Destroy `window`.
    fn destroy_window(&self, window: WindowId) -> TermlayerResult<()>;
    /// Free `pixmap`.
    fn free_pixmap(&self, pixmap: PixmapId) -> TermlayerResult<()>;
    /// Free `gc`.
    fn free_gc(&self, gc: GcId) -> TermlayerResult<()>;

    /// Current pixel size of `window`.
    fn window_size(&self, window: WindowId) -> TermlayerResult<Dimensions>;
    /// Resize increment from the window manager size hints of `window`, if set.
    fn resize_increment(&self, window: WindowId) -> TermlayerResult<Option<Dimensions>>;

    /// Send buffered requests.
    fn flush(&self) -> TermlayerResult<()>;
    /// Send buffered requests and wait until the server processed them.
    fn sync(&self) -> TermlayerResult<()>;
    /// Read one event, waiting for it when `block` is set.
    fn next_event(&self, block: bool) -> TermlayerResult<Option<ServerEvent>>;
}
