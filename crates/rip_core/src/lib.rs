//! RIP Core - Importer for Ninja Ripper `.rip` draw call captures.
//!
//! This crate provides:
//!
//! - **Capture parsing**: the binary `.rip` layout, attribute decoding
//! - **Shader scanning**: vertex input and sampler declarations from the
//!   dumped assembly listings, used to drop attributes the program ignores
//! - **Conversion**: oriented positions, winding, normals, UV sets, vertex
//!   colors and skin weights
//! - **Import driver**: single file and batch import into a [`MeshSink`]
//!
//! # Example
//!
//! ```ignore
//! use rip_core::{import_rip, ImportSettings, MeshCollector};
//!
//! let options = ImportSettings::default().to_options()?;
//! let mut meshes = MeshCollector::new();
//! if let Some(handle) = import_rip("Mesh_0001.rip", &options, &mut meshes)? {
//!     let mesh = &meshes.meshes()[handle];
//!     println!("{}: {} triangles", mesh.name, mesh.triangle_count());
//! }
//! ```

pub mod convert;
pub mod import;
pub mod mesh;
pub mod rip;
pub mod shader;
mod text;

// Re-export commonly used types
pub use convert::{convert, AxisScale, ConversionConfig, ImportOptions, ImportSettings, MeshChannels};
pub use import::{
    import_batch, import_rip, import_with_settings, prepare_import, BatchReport, ImportError,
    ImportResult, PreparedImport,
};
pub use mesh::{Mesh, MeshCollector, MeshSink, MeshSummary, TextureSlot};
pub use rip::{load_rip, parse_rip, CaptureFile, FormatError, LoadError, Semantic};
pub use shader::ShaderInfo;
pub use text::decode_cp437;
