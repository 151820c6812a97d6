//! Fitting image extents into layer boxes.

/// Scale policies and their wire names.
pub mod policy;
/// The pure placement function.
pub mod scaler;
