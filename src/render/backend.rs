use std::path::Path;

use crate::foundation::core::{CellRect, CellSize};
use crate::foundation::error::TermlayerResult;
use crate::render::native::{NativeBackend, NativeBackendOpts};
use crate::render::process::{ProcessBackend, ProcessBackendOpts};
use crate::scale::policy::ScalePolicy;

/// Full state of one layer as handed to a backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawRequest<'a> {
    /// Layer identity.
    pub name: &'a str,
    /// Requested box on the terminal grid.
    pub rect: CellRect,
    /// Resolved local image file.
    pub path: &'a Path,
    /// How the image is fit into `rect`.
    pub policy: ScalePolicy,
    /// Anchor of the scaled image inside the box, both axes in `[0, 1]`.
    pub scaling_position: (f64, f64),
    /// Whether the layer is shown.
    pub visible: bool,
    /// Wait until the draw has been processed before returning.
    pub synchronous: bool,
}

/// A place layers can be drawn to.
///
/// Implementations are keyed by [`DrawRequest::name`]. Issuing identical state twice must not
/// recreate anything.
pub trait RenderBackend: Send + Sync {
    /// Bring the layer named in `req` in line with it.
    fn issue(&self, req: &DrawRequest<'_>) -> TermlayerResult<()>;

    /// Remove the layer `name` and release everything held for it.
    fn retract(&self, name: &str) -> TermlayerResult<()>;

    /// Release every layer and the backend itself.
    fn shutdown(&self) -> TermlayerResult<()>;

    /// Handle pending server events. Returns how many layers were repainted.
    fn pump_events(&self, _block: bool) -> TermlayerResult<usize> {
        Ok(0)
    }

    /// Pixel size of one terminal cell, when the backend knows it.
    fn cell_size(&self) -> TermlayerResult<Option<CellSize>> {
        Ok(None)
    }
}

/// Available backend kinds.
///
/// - `Native` draws X11 child windows under the terminal window.
/// - `Process` drives an external renderer over its stdin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendKind {
    /// Direct X11 client.
    #[default]
    Native,
    /// External renderer process.
    Process,
}

/// Settings for every backend kind. Only the one matching the selected kind is read.
#[derive(Debug, Default)]
pub struct BackendSettings {
    /// Used by [`BackendKind::Native`]. `None` reads the anchor from the environment.
    pub native: Option<NativeBackendOpts>,
    /// Used by [`BackendKind::Process`].
    pub process: ProcessBackendOpts,
}

/// Create a backend implementation.
pub fn create_backend(
    kind: BackendKind,
    settings: BackendSettings,
) -> TermlayerResult<Box<dyn RenderBackend>> {
    match kind {
        BackendKind::Native => {
            let opts = match settings.native {
                Some(opts) => opts,
                None => NativeBackendOpts::from_env()?,
            };
            Ok(Box::new(NativeBackend::connect(opts)?))
        }
        BackendKind::Process => Ok(Box::new(ProcessBackend::new(settings.process))),
    }
}
