// Re-export glam for convenience
pub use glam::*;

// Bounding boxes
mod bounds;
pub use bounds::Bounds;

// Orientation helpers for captured geometry
mod orientation;
pub use orientation::{axis_conversion, mirror_x, Axis, Mat3Ext, OrientationError};
