//! Ninja Ripper `.rip` capture support.
//!
//! A capture is a dump of one draw call: the index buffer, the vertex
//! buffer with its attribute layout, and the names of the textures and
//! shader listings that were bound.
//!
//! ## Supported
//!
//! - Capture version 4
//! - float32 / uint32 / int32 vertex components
//! - Shader listing lookup next to the capture and in `../Shaders`
//!
//! # Example
//!
//! ```ignore
//! use rip_core::rip::{load_rip, Semantic};
//!
//! let mut capture = load_rip("Mesh_0001.rip")?;
//! capture.attach_shaders();
//! for attr in capture.used_attributes(&Semantic::TexCoord) {
//!     println!("TEXCOORD{} ({} items)", attr.semantic_index, attr.items());
//! }
//! ```

mod attribute;
mod capture;
mod parser;
mod resolve;

pub use attribute::*;
pub use capture::*;
pub use parser::*;
pub use resolve::*;

#[cfg(test)]
pub(crate) use parser::test_util;
