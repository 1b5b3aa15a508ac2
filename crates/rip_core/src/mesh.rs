//! Host-side mesh building.
//!
//! The import driver never constructs meshes itself; it hands converted
//! channels to a [`MeshSink`], which owns whatever mesh representation the
//! host uses. [`MeshCollector`] is the in-memory sink used by the
//! command-line tools and tests.

use std::collections::BTreeMap;
use std::path::PathBuf;

use rip_math::{Bounds, Vec2, Vec3};
use serde::Serialize;

/// A texture bound to the captured draw call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TextureSlot {
    /// Name as stored in the capture
    pub name: String,

    /// Name resolved against the capture's directory
    pub path: PathBuf,

    /// Whether the texture should be active on the material
    pub enabled: bool,
}

/// Receiver for converted mesh data.
///
/// `build_mesh` is always called first; every other method refers to the
/// handle it returned.
pub trait MeshSink {
    type Handle;

    fn build_mesh(&mut self, name: &str, positions: &[Vec3], faces: &[[u32; 3]]) -> Self::Handle;

    fn set_custom_normals(&mut self, mesh: &Self::Handle, normals: &[Vec3]);

    fn add_uv_channel(&mut self, mesh: &Self::Handle, name: &str, uvs: &[Vec2]);

    /// `colors` holds one RGB triple per vertex.
    fn add_color_channel(&mut self, mesh: &Self::Handle, name: &str, colors: &[Vec3]);

    /// `weights` maps vertex index to weight; vertices without weight are absent.
    fn add_weight_group(&mut self, mesh: &Self::Handle, name: &str, weights: &BTreeMap<u32, f32>);

    fn attach_textures(&mut self, mesh: &Self::Handle, textures: &[TextureSlot]);

    fn set_shader_names(&mut self, mesh: &Self::Handle, names: &[String]);
}

/// Per-vertex data under a name.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedChannel<T> {
    pub name: String,
    pub values: Vec<T>,
}

/// Named sparse vertex weights.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexGroup {
    pub name: String,
    pub weights: BTreeMap<u32, f32>,
}

/// An imported mesh with all of its channels.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub name: String,

    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Triangles as vertex index triples
    pub faces: Vec<[u32; 3]>,

    /// Custom split normals, one per vertex
    pub normals: Option<Vec<Vec3>>,

    pub uv_channels: Vec<NamedChannel<Vec2>>,
    pub color_channels: Vec<NamedChannel<Vec3>>,
    pub vertex_groups: Vec<VertexGroup>,
    pub textures: Vec<TextureSlot>,

    /// Shader listing names recorded on the mesh
    pub shader_names: Vec<String>,

    /// Axis-aligned bounds, `None` for a mesh without vertices
    pub bounds: Option<Bounds>,
}

impl Mesh {
    /// Create a mesh from positions and faces, with no other channels.
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Self {
        let bounds = Bounds::from_points(&positions);
        Self {
            name: name.into(),
            positions,
            faces,
            normals: None,
            uv_channels: Vec::new(),
            color_channels: Vec::new(),
            vertex_groups: Vec::new(),
            textures: Vec::new(),
            shader_names: Vec::new(),
            bounds,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    pub fn uv_channel(&self, name: &str) -> Option<&[Vec2]> {
        self.uv_channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn color_channel(&self, name: &str) -> Option<&[Vec3]> {
        self.color_channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn vertex_group(&self, name: &str) -> Option<&BTreeMap<u32, f32>> {
        self.vertex_groups
            .iter()
            .find(|g| g.name == name)
            .map(|g| &g.weights)
    }

    /// Get the mesh center (center of bounding box).
    pub fn center(&self) -> Vec3 {
        self.bounds.map_or(Vec3::ZERO, |b| b.center())
    }

    /// Get the mesh size (diagonal length of bounding box).
    pub fn size(&self) -> f32 {
        self.bounds.map_or(0.0, |b| b.diagonal())
    }

    /// Compact description for reports.
    pub fn summary(&self) -> MeshSummary {
        MeshSummary {
            name: self.name.clone(),
            vertices: self.vertex_count(),
            triangles: self.triangle_count(),
            normals: self.has_normals(),
            uv_channels: self.uv_channels.iter().map(|c| c.name.clone()).collect(),
            color_channels: self.color_channels.iter().map(|c| c.name.clone()).collect(),
            vertex_groups: self.vertex_groups.len(),
            textures: self.textures.iter().map(|t| t.name.clone()).collect(),
            size: self.size(),
        }
    }
}

/// Serializable overview of one [`Mesh`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MeshSummary {
    pub name: String,
    pub vertices: usize,
    pub triangles: usize,
    pub normals: bool,
    pub uv_channels: Vec<String>,
    pub color_channels: Vec<String>,
    pub vertex_groups: usize,
    pub textures: Vec<String>,
    pub size: f32,
}

/// Sink that keeps every mesh in memory. Handles are indices into
/// [`MeshCollector::meshes`].
#[derive(Clone, Debug, Default)]
pub struct MeshCollector {
    meshes: Vec<Mesh>,
}

impl MeshCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn into_meshes(self) -> Vec<Mesh> {
        self.meshes
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    fn mesh_mut(&mut self, handle: usize) -> Option<&mut Mesh> {
        let mesh = self.meshes.get_mut(handle);
        if mesh.is_none() {
            log::warn!("Ignoring data for unknown mesh handle {}", handle);
        }
        mesh
    }
}

impl MeshSink for MeshCollector {
    type Handle = usize;

    fn build_mesh(&mut self, name: &str, positions: &[Vec3], faces: &[[u32; 3]]) -> usize {
        self.meshes.push(Mesh::new(name, positions.to_vec(), faces.to_vec()));
        self.meshes.len() - 1
    }

    fn set_custom_normals(&mut self, mesh: &usize, normals: &[Vec3]) {
        if let Some(mesh) = self.mesh_mut(*mesh) {
            mesh.normals = Some(normals.to_vec());
        }
    }

    fn add_uv_channel(&mut self, mesh: &usize, name: &str, uvs: &[Vec2]) {
        if let Some(mesh) = self.mesh_mut(*mesh) {
            mesh.uv_channels.push(NamedChannel {
                name: name.to_string(),
                values: uvs.to_vec(),
            });
        }
    }

    fn add_color_channel(&mut self, mesh: &usize, name: &str, colors: &[Vec3]) {
        if let Some(mesh) = self.mesh_mut(*mesh) {
            mesh.color_channels.push(NamedChannel {
                name: name.to_string(),
                values: colors.to_vec(),
            });
        }
    }

    fn add_weight_group(&mut self, mesh: &usize, name: &str, weights: &BTreeMap<u32, f32>) {
        if let Some(mesh) = self.mesh_mut(*mesh) {
            mesh.vertex_groups.push(VertexGroup {
                name: name.to_string(),
                weights: weights.clone(),
            });
        }
    }

    fn attach_textures(&mut self, mesh: &usize, textures: &[TextureSlot]) {
        if let Some(mesh) = self.mesh_mut(*mesh) {
            mesh.textures.extend_from_slice(textures);
        }
    }

    fn set_shader_names(&mut self, mesh: &usize, names: &[String]) {
        if let Some(mesh) = self.mesh_mut(*mesh) {
            mesh.shader_names = names.to_vec();
        }
    }
}
