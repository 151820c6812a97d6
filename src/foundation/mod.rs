/// Geometry primitives shared by the scaler and the backends.
pub mod core;
/// Error taxonomy.
pub mod error;
