//! Capture to mesh conversion.
//!
//! [`convert`] turns a parsed (and optionally shader-resolved) capture into
//! [`MeshChannels`]: oriented positions and faces plus whatever normals,
//! UVs, colors and skin weights the capture carries.

mod config;
mod pipeline;

pub use config::*;
pub use pipeline::*;
