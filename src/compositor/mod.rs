//! Named layers, dirty tracking and render scheduling over one [`RenderBackend`].

/// Layer state and file change stamps.
pub mod layer;

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::foundation::core::{CellRect, CellSize, Dimensions, Geometry, PixelRect};
use crate::foundation::error::{TermlayerError, TermlayerResult};
use crate::pixel::decode::{check_source_path, image_dimensions};
use crate::render::backend::RenderBackend;
use crate::scale::policy::ScalePolicy;
use crate::scale::scaler::scale;

pub use layer::Layer;

use layer::Stamp;

/// Construction options for [`Compositor`].
#[derive(Clone, Copy, Debug)]
pub struct CompositorOpts {
    /// Modification times closer than this count as equal.
    pub mtime_granularity: Duration,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            mtime_granularity: Duration::from_millis(200),
        }
    }
}

/// Where a layer's image ends up once scaled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerPlacement {
    /// Scaled image in pixels, relative to the anchor.
    pub pixels: PixelRect,
    /// Cells fully covered by the scaled image.
    pub cells: CellRect,
}

/// Layer registry that redraws through its backend only when something changed.
///
/// `render` is meant to be driven from a single loop. Idle layers cost one file stat per call.
pub struct Compositor {
    backend: Box<dyn RenderBackend>,
    layers: HashMap<String, Layer>,
    order: Vec<String>,
    dirty: bool,
    opts: CompositorOpts,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("order", &self.order)
            .field("dirty", &self.dirty)
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl Compositor {
    /// A compositor drawing through `backend`.
    pub fn new(backend: Box<dyn RenderBackend>, opts: CompositorOpts) -> Self {
        Self {
            backend,
            layers: HashMap::new(),
            order: Vec::new(),
            dirty: false,
            opts,
        }
    }

    /// The backend layers are drawn through.
    pub fn backend(&self) -> &dyn RenderBackend {
        &*self.backend
    }

    /// Whether the next [`Compositor::render`] will reach the backend regardless of file changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty || self.layers.values().any(|l| l.draw_queued)
    }

    /// Layer names in registration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Look up a layer without creating it.
    pub fn get(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    /// Get the layer `name`, creating an inactive one on first reference.
    pub fn layer(&mut self, name: &str) -> &Layer {
        self.layer_mut(name)
    }

    fn layer_mut(&mut self, name: &str) -> &mut Layer {
        if !self.layers.contains_key(name) {
            tracing::debug!(layer = name, "created layer");
            self.order.push(name.to_owned());
        }
        self.layers
            .entry(name.to_owned())
            .or_insert_with(|| Layer::new(name))
    }

    /// Drop the layer `name`, retracting it from the backend first when shown.
    ///
    /// Returns whether the layer existed.
    pub fn remove_layer(&mut self, name: &str) -> TermlayerResult<bool> {
        let Some(layer) = self.layers.remove(name) else {
            return Ok(false);
        };
        self.order.retain(|n| n != name);
        tracing::debug!(layer = name, "removed layer");
        if layer.materialized {
            self.backend.retract(name)?;
        }
        Ok(true)
    }

    /// Point the layer at a resolved local file. An empty path deactivates it.
    pub fn set_source(&mut self, name: &str, path: impl AsRef<Path>) -> TermlayerResult<()> {
        let path = path.as_ref();
        let next = if path.as_os_str().is_empty() {
            None
        } else {
            check_source_path(path)?;
            Some(path.to_path_buf())
        };
        self.update(name, |l| {
            let changed = l.source != next;
            if changed {
                l.source = next;
                l.stamp = Stamp::Unknown;
            }
            changed
        });
        Ok(())
    }

    /// Show or hide the layer.
    pub fn set_visible(&mut self, name: &str, visible: bool) {
        self.update(name, |l| replace(&mut l.visible, visible));
    }

    /// Set the requested box in cells.
    pub fn set_rect(&mut self, name: &str, rect: CellRect) {
        self.update(name, |l| replace(&mut l.rect, rect));
    }

    /// Move the layer, keeping its size.
    pub fn set_position(&mut self, name: &str, x: i32, y: i32) {
        self.update(name, |l| {
            let rect = CellRect { x, y, ..l.rect };
            replace(&mut l.rect, rect)
        });
    }

    /// Resize the layer box, keeping its position.
    pub fn set_size(&mut self, name: &str, width: u32, height: u32) {
        self.update(name, |l| {
            let rect = CellRect {
                width,
                height,
                ..l.rect
            };
            replace(&mut l.rect, rect)
        });
    }

    /// Set the fit policy.
    pub fn set_policy(&mut self, name: &str, policy: ScalePolicy) {
        self.update(name, |l| replace(&mut l.policy, policy));
    }

    /// Set the anchor of the scaled image inside the box. Values are clamped to `[0, 1]`.
    pub fn set_scaling_position(&mut self, name: &str, x: f64, y: f64) {
        let pos = (clamp_unit(x), clamp_unit(y));
        self.update(name, |l| replace(&mut l.scaling_position, pos));
    }

    /// Make draws of the layer wait for completion.
    pub fn set_synchronous(&mut self, name: &str, synchronous: bool) {
        self.update(name, |l| replace(&mut l.synchronous, synchronous));
    }

    /// Force a redraw of `name` on the next render.
    pub fn queue_redraw(&mut self, name: &str) {
        self.update(name, |_| true);
    }

    fn update(&mut self, name: &str, apply: impl FnOnce(&mut Layer) -> bool) {
        let layer = self.layer_mut(name);
        if apply(layer) {
            layer.draw_queued = true;
        }
    }

    /// Bring the backend in line with every layer, if anything changed since the last pass.
    ///
    /// Returns the number of backend calls made. The first backend error aborts the pass; layers
    /// issued before it stay issued and the next call retries.
    #[tracing::instrument(level = "debug", skip(self), fields(layers = self.order.len()))]
    pub fn render(&mut self) -> TermlayerResult<usize> {
        let granularity = self.opts.mtime_granularity;
        for name in &self.order {
            let Some(layer) = self.layers.get_mut(name) else {
                continue;
            };
            let queued = std::mem::take(&mut layer.draw_queued);
            let Some(path) = layer.source.as_deref() else {
                self.dirty |= queued;
                continue;
            };
            let stamp = Stamp::observe(path, granularity);
            if queued || layer.stamp.changed_to(stamp) {
                tracing::trace!(layer = %name, queued, "layer dirty");
                self.dirty = true;
            }
            layer.stamp = stamp;
        }

        if !self.dirty {
            tracing::trace!("nothing to draw");
            return Ok(0);
        }

        let mut calls = 0;
        for name in &self.order {
            let Some(layer) = self.layers.get_mut(name) else {
                continue;
            };
            if layer.source.is_none() || !layer.visible {
                if layer.materialized {
                    calls += 1;
                    self.backend.retract(name)?;
                    layer.materialized = false;
                }
                continue;
            }
            // A failed draw can still leave backend state behind for the layer.
            layer.materialized = true;
            let Some(req) = layer.request() else {
                continue;
            };
            calls += 1;
            self.backend.issue(&req)?;
        }
        self.dirty = false;
        tracing::debug!(calls, "render pass");
        Ok(calls)
    }

    /// Where the image of `name` lands for a given cell size, read from the image header.
    ///
    /// `None` when the layer is inactive or its box is empty.
    pub fn placement(
        &self,
        name: &str,
        cell: CellSize,
    ) -> TermlayerResult<Option<LayerPlacement>> {
        let layer = self
            .layers
            .get(name)
            .ok_or_else(|| TermlayerError::config(format!("unknown layer '{name}'")))?;
        let Some(path) = layer.source() else {
            return Ok(None);
        };
        let image = image_dimensions(path)?;
        let window = layer.rect.to_pixels(cell);
        if image.is_degenerate() || window.size().is_degenerate() {
            return Ok(None);
        }
        let placed: Dimensions = scale(Geometry::new(image, window.size()), layer.policy).image;
        let pixels = PixelRect {
            x: window.x,
            y: window.y,
            width: placed.w,
            height: placed.h,
        };
        Ok(Some(LayerPlacement {
            pixels,
            cells: pixels.to_cells(cell),
        }))
    }

    /// Retract every shown layer, then shut the backend down. Returns the first error.
    pub fn shutdown(&mut self) -> TermlayerResult<()> {
        let mut first: Option<TermlayerError> = None;
        for name in &self.order {
            let Some(layer) = self.layers.get_mut(name) else {
                continue;
            };
            if !layer.materialized {
                continue;
            }
            layer.materialized = false;
            if let Err(e) = self.backend.retract(name) {
                tracing::warn!(layer = %name, error = %e, "retract during shutdown failed");
                first.get_or_insert(e);
            }
        }
        if let Err(e) = self.backend.shutdown() {
            first.get_or_insert(e);
        }
        first.map_or(Ok(()), Err)
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/compositor.rs"]
mod tests;
