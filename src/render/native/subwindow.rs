use std::path::PathBuf;
use std::time::SystemTime;

use crate::foundation::core::{Dimensions, Geometry, PixelRect};
use crate::foundation::error::{TermlayerError, TermlayerResult};
use crate::pixel::buffer::PixelBuffer;
use crate::pixel::convert::convert;
use crate::pixel::decode::decode_file;
use crate::pixel::resize::{ResampleFilter, resize};
use crate::render::native::server::{
    DisplayServer, GcId, PixmapId, ScreenFormat, WindowId,
};
use crate::render::native::upload::upload;
use crate::scale::policy::ScalePolicy;
use crate::scale::scaler::scale;

const MAX_EXTENT: u32 = u16::MAX as u32;

/// Identity of image content: the file and the modification time it was read at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SourceKey {
    pub(crate) path: PathBuf,
    pub(crate) modified: Option<SystemTime>,
}

/// Everything that decides what a subwindow shows, besides visibility.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Placement {
    /// Requested box in pixels relative to the anchor.
    pub(crate) rect: PixelRect,
    pub(crate) policy: ScalePolicy,
    pub(crate) source: SourceKey,
}

/// Per-session values shared by all subwindows of one backend.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DrawContext {
    pub(crate) parent: WindowId,
    pub(crate) format: ScreenFormat,
    pub(crate) filter: ResampleFilter,
    pub(crate) synchronous: bool,
}

/// Server resources backing a shown subwindow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Materialized {
    pub(crate) window: WindowId,
    pub(crate) pixmap: PixmapId,
    pub(crate) gc: GcId,
    pub(crate) origin: (i32, i32),
    pub(crate) size: Dimensions,
    pub(crate) mapped: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Resources {
    Absent,
    Created(Materialized),
}

#[derive(Clone, Debug)]
struct CachedSource {
    key: SourceKey,
    buffer: PixelBuffer,
}

/// One named image slot materialized as a child window, a pixmap and a graphics context.
#[derive(Debug)]
pub(crate) struct SubWindow {
    name: String,
    resources: Resources,
    source: Option<CachedSource>,
    scaled: Option<PixelBuffer>,
    /// Last placement fully applied. `None` forces the next visible issue to redo everything.
    applied: Option<Placement>,
}

impl SubWindow {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: Resources::Absent,
            source: None,
            scaled: None,
            applied: None,
        }
    }

    pub(crate) fn resources(&self) -> Resources {
        self.resources
    }

    /// Unmap the window, keeping every resource for a later [`SubWindow::show`].
    pub(crate) fn hide<S: DisplayServer + ?Sized>(&mut self, server: &S) -> TermlayerResult<()> {
        self.set_mapped(server, false)
    }

    /// Bring the server state in line with `next` and make it visible.
    pub(crate) fn show<S: DisplayServer + ?Sized>(
        &mut self,
        server: &S,
        ctx: &DrawContext,
        next: Placement,
    ) -> TermlayerResult<()> {
        if self.applied.as_ref() == Some(&next) {
            if let Resources::Created(m) = self.resources
                && !m.mapped
            {
                self.set_mapped(server, true)?;
                self.blit(server)?;
                finish(server, ctx.synchronous)?;
            }
            return Ok(());
        }

        match self.apply(server, ctx, &next) {
            Ok(()) => {
                self.applied = Some(next);
                finish(server, ctx.synchronous)
            }
            Err(e) => {
                self.applied = None;
                if let Err(teardown) = self.teardown(server) {
                    tracing::warn!(
                        layer = %self.name,
                        error = %teardown,
                        "teardown after failed draw"
                    );
                }
                Err(e)
            }
        }
    }

    /// Repaint from the cached pixmap. Returns `true` when something was drawn.
    pub(crate) fn expose<S: DisplayServer + ?Sized>(&self, server: &S) -> TermlayerResult<bool> {
        match self.resources {
            Resources::Created(m) if m.mapped => {
                server.copy_area(m.pixmap, m.window, m.gc, m.size)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Free every server resource and cached buffer.
    pub(crate) fn retract<S: DisplayServer + ?Sized>(&mut self, server: &S) -> TermlayerResult<()> {
        self.source = None;
        self.scaled = None;
        self.applied = None;
        self.teardown(server)
    }

    fn apply<S: DisplayServer + ?Sized>(
        &mut self,
        server: &S,
        ctx: &DrawContext,
        next: &Placement,
    ) -> TermlayerResult<()> {
        let content_changed = self.load_source(&next.source)?;
        let Some(source) = self.source.as_ref() else {
            return self.teardown(server);
        };

        let placed = renderable_extent(source.buffer.dimensions(), next.rect.size(), next.policy)?;
        let Some(placed) = placed else {
            tracing::debug!(layer = %self.name, "draw not renderable");
            return self.teardown(server);
        };

        let rescale = content_changed
            || self
                .scaled
                .as_ref()
                .is_none_or(|s| s.dimensions() != placed);
        if rescale {
            self.scaled = Some(resize(&source.buffer, placed, ctx.filter)?);
        }

        match self.resources {
            Resources::Created(mut m) if m.size == placed => {
                let origin = (next.rect.x, next.rect.y);
                if m.origin != origin {
                    server.move_window(m.window, origin.0, origin.1)?;
                    m.origin = origin;
                }
                if content_changed {
                    self.upload_scaled(server, ctx, &m)?;
                }
                self.resources = Resources::Created(m);
                self.set_mapped(server, true)?;
            }
            _ => {
                self.teardown(server)?;
                self.materialize(server, ctx, next.rect, placed)?;
            }
        }
        self.blit(server)
    }

    /// Decode `key` unless it is already cached. Returns `true` when the content changed.
    fn load_source(&mut self, key: &SourceKey) -> TermlayerResult<bool> {
        if self.source.as_ref().is_some_and(|s| &s.key == key) {
            return Ok(false);
        }
        self.source = None;
        self.scaled = None;
        let decoded = decode_file(&key.path)?;
        let buffer = convert(&decoded);
        tracing::debug!(
            layer = %self.name,
            path = %key.path.display(),
            width = buffer.width(),
            height = buffer.height(),
            "decoded source"
        );
        self.source = Some(CachedSource {
            key: key.clone(),
            buffer,
        });
        Ok(true)
    }

    fn materialize<S: DisplayServer + ?Sized>(
        &mut self,
        server: &S,
        ctx: &DrawContext,
        rect: PixelRect,
        placed: Dimensions,
    ) -> TermlayerResult<()> {
        let window_rect = PixelRect {
            x: rect.x,
            y: rect.y,
            width: placed.w,
            height: placed.h,
        };
        let window = server.create_window(ctx.parent, ctx.format, window_rect)?;
        let pixmap = match server.create_pixmap(ctx.format, window, placed) {
            Ok(p) => p,
            Err(e) => {
                release(server.destroy_window(window));
                return Err(e);
            }
        };
        let gc = match server.create_gc(pixmap) {
            Ok(g) => g,
            Err(e) => {
                release(server.free_pixmap(pixmap));
                release(server.destroy_window(window));
                return Err(e);
            }
        };

        let m = Materialized {
            window,
            pixmap,
            gc,
            origin: (rect.x, rect.y),
            size: placed,
            mapped: false,
        };
        self.resources = Resources::Created(m);
        tracing::debug!(
            layer = %self.name,
            window = window.0,
            width = placed.w,
            height = placed.h,
            "created subwindow"
        );

        self.upload_scaled(server, ctx, &m)?;
        self.set_mapped(server, true)
    }

    fn upload_scaled<S: DisplayServer + ?Sized>(
        &self,
        server: &S,
        ctx: &DrawContext,
        m: &Materialized,
    ) -> TermlayerResult<()> {
        let Some(scaled) = self.scaled.as_ref() else {
            return Ok(());
        };
        let transfers = upload(server, m.pixmap, m.gc, ctx.format.depth, scaled)?;
        tracing::debug!(layer = %self.name, transfers, "uploaded pixels");
        Ok(())
    }

    fn set_mapped<S: DisplayServer + ?Sized>(
        &mut self,
        server: &S,
        mapped: bool,
    ) -> TermlayerResult<()> {
        let Resources::Created(m) = &mut self.resources else {
            return Ok(());
        };
        if m.mapped == mapped {
            return Ok(());
        }
        if mapped {
            server.map_window(m.window)?;
        } else {
            server.unmap_window(m.window)?;
        }
        m.mapped = mapped;
        server.flush()
    }

    fn blit<S: DisplayServer + ?Sized>(&self, server: &S) -> TermlayerResult<()> {
        self.expose(server).map(|_| ())
    }

    /// Destroy server resources. The state is `Absent` afterwards even when a call fails.
    fn teardown<S: DisplayServer + ?Sized>(&mut self, server: &S) -> TermlayerResult<()> {
        let Resources::Created(m) = std::mem::replace(&mut self.resources, Resources::Absent) else {
            return Ok(());
        };
        tracing::debug!(layer = %self.name, window = m.window.0, "destroying subwindow");
        let results = [
            server.destroy_window(m.window),
            server.free_pixmap(m.pixmap),
            server.free_gc(m.gc),
        ];
        results.into_iter().collect()
    }
}

/// Placed extent of a draw, or `None` when nothing can be shown.
///
/// Window and pixmap extents are 16-bit on the wire, so larger placements fail before any
/// buffer is allocated for them.
fn renderable_extent(
    image: Dimensions,
    window: Dimensions,
    policy: ScalePolicy,
) -> TermlayerResult<Option<Dimensions>> {
    if image.is_degenerate() || window.is_degenerate() {
        return Ok(None);
    }
    let placed = scale(Geometry::new(image, window), policy).image;
    if placed.w > MAX_EXTENT || placed.h > MAX_EXTENT {
        return Err(TermlayerError::resource(format!(
            "placed extent {}x{} exceeds {MAX_EXTENT}",
            placed.w, placed.h
        )));
    }
    Ok((!placed.is_degenerate()).then_some(placed))
}

fn finish<S: DisplayServer + ?Sized>(server: &S, synchronous: bool) -> TermlayerResult<()> {
    if synchronous {
        server.sync()
    } else {
        server.flush()
    }
}

fn release(result: TermlayerResult<()>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "releasing partially created resource");
    }
}
