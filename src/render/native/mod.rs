//! Direct X11 backend: every layer is a child window of the terminal window, painted from a
//! server-side pixmap.

/// Anchor window, terminal grid and character cell sizing.
pub mod cell;
/// The windowing-protocol seam the backend is written against.
pub mod server;
/// Per-layer window state machine.
pub(crate) mod subwindow;
/// Chunked pixel upload.
pub(crate) mod upload;
/// `x11rb` implementation of [`server::DisplayServer`].
pub mod x11;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, RwLock};

use crate::foundation::core::CellSize;
use crate::foundation::error::{TermlayerError, TermlayerResult};
use crate::pixel::decode::check_source_path;
use crate::pixel::resize::ResampleFilter;
use crate::render::backend::{DrawRequest, RenderBackend};

pub use cell::{ANCHOR_ENV, AnchorWindow, FixedGrid, TerminalGrid};
pub use server::{DisplayServer, GcId, PixmapId, ScreenFormat, ServerEvent, WindowId};
pub use x11::X11Server;

use cell::resolve_cell_size;
use subwindow::{DrawContext, Placement, SourceKey, SubWindow};

/// Construction options for [`NativeBackend`].
#[derive(Clone, Debug)]
pub struct NativeBackendOpts {
    /// Window the subwindows are embedded in.
    pub anchor: AnchorWindow,
    /// Filter used when fitting images to their box.
    pub resample: ResampleFilter,
    /// Column and line count of the terminal, used when the window manager gives no cell size.
    pub grid: Arc<dyn TerminalGrid>,
}

impl NativeBackendOpts {
    /// Options for `anchor` with default resampling and an unknown grid.
    pub fn new(anchor: AnchorWindow) -> Self {
        Self {
            anchor,
            resample: ResampleFilter::default(),
            grid: Arc::new(FixedGrid::default()),
        }
    }

    /// Anchor from [`ANCHOR_ENV`], grid from `COLUMNS`/`LINES` read at each lookup.
    pub fn from_env() -> TermlayerResult<Self> {
        Ok(Self {
            grid: Arc::new(env_grid),
            ..Self::new(AnchorWindow::from_env()?)
        })
    }
}

fn env_grid() -> Option<(u32, u32)> {
    let read = |key: &str| std::env::var(key).ok()?.trim().parse::<u32>().ok();
    FixedGrid::new(read("COLUMNS")?, read("LINES")?).grid_size()
}

type Slot = Arc<Mutex<SubWindow>>;

/// Draws layers as child windows of an anchor window over one shared server connection.
#[derive(Debug)]
pub struct NativeBackend<S: DisplayServer = X11Server> {
    server: Arc<S>,
    opts: NativeBackendOpts,
    format: OnceLock<ScreenFormat>,
    windows: RwLock<HashMap<String, Slot>>,
}

impl NativeBackend<X11Server> {
    /// Connect to the display named by `DISPLAY`.
    pub fn connect(opts: NativeBackendOpts) -> TermlayerResult<Self> {
        let server = X11Server::connect(None)?;
        tracing::debug!(anchor = opts.anchor.window().0, "connected to X server");
        Ok(Self::with_server(Arc::new(server), opts))
    }
}

impl<S: DisplayServer> NativeBackend<S> {
    /// Backend over an existing server connection.
    pub fn with_server(server: Arc<S>, opts: NativeBackendOpts) -> Self {
        Self {
            server,
            opts,
            format: OnceLock::new(),
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// The shared server connection.
    pub fn server(&self) -> &Arc<S> {
        &self.server
    }

    /// Names of layers that currently hold a subwindow slot.
    pub fn layer_names(&self) -> Vec<String> {
        let windows = self.windows.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = windows.keys().cloned().collect();
        names.sort();
        names
    }

    fn screen_format(&self) -> TermlayerResult<ScreenFormat> {
        if let Some(format) = self.format.get() {
            return Ok(*format);
        }
        let format = self.server.screen_format()?;
        tracing::debug!(depth = format.depth, visual = format.visual, "resolved screen format");
        Ok(*self.format.get_or_init(|| format))
    }

    fn slot(&self, name: &str) -> Slot {
        if let Some(slot) = self
            .windows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Arc::clone(slot);
        }
        let mut windows = self.windows.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            windows
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(Mutex::new(SubWindow::new(name)))),
        )
    }

    fn existing_slot(&self, name: &str) -> Option<Slot> {
        self.windows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

impl<S: DisplayServer> RenderBackend for NativeBackend<S> {
    #[tracing::instrument(level = "debug", skip_all, fields(layer = req.name))]
    fn issue(&self, req: &DrawRequest<'_>) -> TermlayerResult<()> {
        if !req.visible {
            return match self.existing_slot(req.name) {
                Some(slot) => lock(&slot).hide(&*self.server),
                None => Ok(()),
            };
        }

        let cell = resolve_cell_size(&*self.server, self.opts.anchor, &*self.opts.grid)?;
        let modified = check_source_path(req.path)?.modified().ok();
        let next = Placement {
            rect: req.rect.to_pixels(cell),
            policy: req.policy,
            source: SourceKey {
                path: req.path.to_path_buf(),
                modified,
            },
        };
        let ctx = DrawContext {
            parent: self.opts.anchor.window(),
            format: self.screen_format()?,
            filter: self.opts.resample,
            synchronous: req.synchronous,
        };

        let slot = self.slot(req.name);
        let mut window = lock(&slot);
        window.show(&*self.server, &ctx, next)
    }

    fn retract(&self, name: &str) -> TermlayerResult<()> {
        let removed = self
            .windows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        let Some(slot) = removed else {
            return Ok(());
        };
        lock(&slot).retract(&*self.server)?;
        self.server.flush()
    }

    fn shutdown(&self) -> TermlayerResult<()> {
        let drained: Vec<(String, Slot)> = self
            .windows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();
        let mut first: Option<TermlayerError> = None;
        for (name, slot) in drained {
            if let Err(e) = lock(&slot).retract(&*self.server) {
                tracing::warn!(layer = %name, error = %e, "retract during shutdown failed");
                first.get_or_insert(e);
            }
        }
        if let Err(e) = self.server.flush() {
            first.get_or_insert(e);
        }
        first.map_or(Ok(()), Err)
    }

    fn pump_events(&self, block: bool) -> TermlayerResult<usize> {
        let Some(event) = self.server.next_event(block)? else {
            return Ok(0);
        };
        match event {
            ServerEvent::Expose { window } => {
                tracing::trace!(window = window.0, "expose");
                let slots: Vec<Slot> = self
                    .windows
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .values()
                    .cloned()
                    .collect();
                let mut repainted = 0;
                for slot in slots {
                    if lock(&slot).expose(&*self.server)? {
                        repainted += 1;
                    }
                }
                if repainted > 0 {
                    self.server.flush()?;
                }
                Ok(repainted)
            }
            ServerEvent::Other => Ok(0),
        }
    }

    fn cell_size(&self) -> TermlayerResult<Option<CellSize>> {
        resolve_cell_size(&*self.server, self.opts.anchor, &*self.opts.grid).map(Some)
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "../../../tests/unit/render/native.rs"]
mod tests;
