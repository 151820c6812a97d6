use std::fmt;

use crate::foundation::core::CellSize;
use crate::foundation::error::{TermlayerError, TermlayerResult};
use crate::render::native::server::{DisplayServer, WindowId};

/// Environment variable carrying the terminal's X window id.
pub const ANCHOR_ENV: &str = "WINDOWID";

/// The pre-existing window that embedded subwindows are parented to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchorWindow(pub WindowId);

impl AnchorWindow {
    /// Read the anchor from [`ANCHOR_ENV`].
    pub fn from_env() -> TermlayerResult<Self> {
        let raw = std::env::var(ANCHOR_ENV)
            .map_err(|_| TermlayerError::config(format!("{ANCHOR_ENV} is not set")))?;
        Self::parse(&raw)
    }

    /// Parse a decimal or `0x`-prefixed hexadecimal window id.
    pub fn parse(raw: &str) -> TermlayerResult<Self> {
        let s = raw.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => s.parse::<u32>(),
        };
        match parsed {
            Ok(id) if id != 0 => Ok(Self(WindowId(id))),
            _ => Err(TermlayerError::config(format!(
                "'{raw}' is not a valid X window id"
            ))),
        }
    }

    /// The window handle.
    pub fn window(self) -> WindowId {
        self.0
    }
}

/// Source of the terminal's current column and line count.
pub trait TerminalGrid: Send + Sync {
    /// `(columns, lines)`, or `None` when unknown.
    fn grid_size(&self) -> Option<(u32, u32)>;
}

impl<F> TerminalGrid for F
where
    F: Fn() -> Option<(u32, u32)> + Send + Sync,
{
    fn grid_size(&self) -> Option<(u32, u32)> {
        self()
    }
}

/// A grid size fixed at construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedGrid {
    columns: u32,
    lines: u32,
}

impl FixedGrid {
    /// A grid of `columns` x `lines`. Zero on either axis means unknown.
    pub fn new(columns: u32, lines: u32) -> Self {
        Self { columns, lines }
    }
}

impl TerminalGrid for FixedGrid {
    fn grid_size(&self) -> Option<(u32, u32)> {
        (self.columns != 0 && self.lines != 0).then_some((self.columns, self.lines))
    }
}

impl fmt::Debug for dyn TerminalGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.grid_size() {
            Some((c, l)) => write!(f, "TerminalGrid({c}x{l})"),
            None => f.write_str("TerminalGrid(unknown)"),
        }
    }
}

/// Resolve the pixel size of one character cell of the terminal behind `anchor`.
///
/// Prefers the window manager's resize increment; falls back to dividing the anchor's pixel
/// size by the grid size when the hint is absent. A failed hint query is returned as is.
pub(crate) fn resolve_cell_size<S: DisplayServer + ?Sized>(
    server: &S,
    anchor: AnchorWindow,
    grid: &dyn TerminalGrid,
) -> TermlayerResult<CellSize> {
    if let Some(inc) = server.resize_increment(anchor.window())? {
        return CellSize::new(inc.w, inc.h);
    }

    let (columns, lines) = grid
        .grid_size()
        .filter(|&(c, l)| c > 0 && l > 0)
        .ok_or_else(|| {
            TermlayerError::resource(
                "cannot determine character cell size: no resize increment and no grid size",
            )
        })?;
    let px = server.window_size(anchor.window())?;
    CellSize::new(px.w / columns, px.h / lines).map_err(|_| {
        TermlayerError::resource(format!(
            "cannot determine character cell size: {}x{} px over {columns}x{lines} cells",
            px.w, px.h
        ))
    })
}
