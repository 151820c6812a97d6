use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::foundation::core::CellRect;
use crate::render::backend::DrawRequest;
use crate::scale::policy::ScalePolicy;

/// Last observed state of a layer's backing file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum Stamp {
    /// Not checked yet.
    #[default]
    Unknown,
    /// Modification time, coarsened to the compositor's granularity.
    Seen(u128),
    /// The file could not be stat'ed.
    Missing,
}

impl Stamp {
    /// Stat `path`, coarsening the modification time to `granularity`.
    pub(crate) fn observe(path: &Path, granularity: Duration) -> Self {
        match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(t) => Self::Seen(coarsen(t, granularity)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "stat failed");
                Self::Missing
            }
        }
    }

    /// Whether moving from `self` to `next` requires a redraw.
    pub(crate) fn changed_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Seen(old), Self::Seen(new)) => new > old,
            (Self::Missing, Self::Missing) => false,
            (Self::Unknown, Self::Seen(_)) => false,
            (_, Self::Unknown) => false,
            _ => true,
        }
    }
}

/// Whole `granularity` ticks since the epoch.
pub(crate) fn coarsen(t: SystemTime, granularity: Duration) -> u128 {
    let nanos = t
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    nanos / granularity.as_nanos().max(1)
}

/// A named image slot on the terminal grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    name: String,
    pub(crate) source: Option<PathBuf>,
    pub(crate) rect: CellRect,
    pub(crate) policy: ScalePolicy,
    pub(crate) scaling_position: (f64, f64),
    pub(crate) visible: bool,
    pub(crate) synchronous: bool,
    pub(crate) draw_queued: bool,
    pub(crate) stamp: Stamp,
    pub(crate) materialized: bool,
}

impl Layer {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            rect: CellRect::default(),
            policy: ScalePolicy::default(),
            scaling_position: (0.0, 0.0),
            visible: true,
            synchronous: false,
            draw_queued: false,
            stamp: Stamp::Unknown,
            materialized: false,
        }
    }

    /// Layer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved image file, `None` while the layer is inactive.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Requested box in cells.
    pub fn rect(&self) -> CellRect {
        self.rect
    }

    /// Fit policy.
    pub fn policy(&self) -> ScalePolicy {
        self.policy
    }

    /// Anchor of the scaled image inside the box.
    pub fn scaling_position(&self) -> (f64, f64) {
        self.scaling_position
    }

    /// Whether the layer should be shown.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether draws of this layer wait for completion.
    pub fn is_synchronous(&self) -> bool {
        self.synchronous
    }

    /// Whether the backend currently shows this layer.
    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    /// Whether a redraw is pending.
    pub fn is_queued(&self) -> bool {
        self.draw_queued
    }

    /// The full draw state, or `None` without a source.
    pub fn request(&self) -> Option<DrawRequest<'_>> {
        let path = self.source.as_deref()?;
        Some(DrawRequest {
            name: &self.name,
            rect: self.rect,
            path,
            policy: self.policy,
            scaling_position: self.scaling_position,
            visible: self.visible,
            synchronous: self.synchronous,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/layer.rs"]
mod tests;
