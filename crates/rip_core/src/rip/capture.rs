//! In-memory representation of one parsed capture.

use std::path::{Path, PathBuf};

use crate::rip::attribute::{AttributeSpec, Semantic};
use crate::shader::ShaderInfo;

/// Counts read from the fixed-size capture header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RipHeader {
    pub version: u32,
    pub face_count: u32,
    pub vertex_count: u32,
    pub vertex_record_size: u32,
    pub texture_count: u32,
    pub shader_count: u32,
    pub attribute_count: u32,
}

/// A parsed `.rip` capture: one draw call's index and vertex buffers.
#[derive(Clone, Debug, Default)]
pub struct CaptureFile {
    /// Header counts as stored in the file
    pub header: RipHeader,

    /// Triangles, degenerate ones already removed
    pub faces: Vec<[u32; 3]>,

    /// Attribute channels in table order, each holding `vertex_count` tuples
    pub attributes: Vec<AttributeSpec>,

    /// Texture file names, relative to the capture's directory
    pub texture_names: Vec<String>,

    /// Shader listing file names
    pub shader_names: Vec<String>,

    /// Number of vertices in the vertex buffer
    pub vertex_count: usize,

    /// Vertex program listing, if one was found and recognized
    pub vertex_shader: Option<ShaderInfo>,

    /// Pixel program listing, if one was found and recognized
    pub fragment_shader: Option<ShaderInfo>,

    /// Directory the capture was loaded from (for textures and shaders)
    pub source_dir: Option<PathBuf>,
}

impl CaptureFile {
    /// Number of triangles dropped by the degenerate-face filter.
    pub fn dropped_face_count(&self) -> usize {
        (self.header.face_count as usize).saturating_sub(self.faces.len())
    }

    /// All attributes with the given semantic, in table order.
    pub fn find_attributes<'a>(
        &'a self,
        semantic: &'a Semantic,
    ) -> impl Iterator<Item = &'a AttributeSpec> + 'a {
        self.attributes.iter().filter(move |a| a.semantic == *semantic)
    }

    /// Resolve a texture name against the capture's directory.
    pub fn texture_path(&self, name: &str) -> PathBuf {
        match &self.source_dir {
            Some(dir) => dir.join(name),
            None => Path::new(name).to_path_buf(),
        }
    }
}
