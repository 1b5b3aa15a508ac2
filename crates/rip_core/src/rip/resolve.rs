//! Cross-referencing captured attributes with the shader listings.

use std::path::{Path, PathBuf};

use crate::rip::attribute::{AttributeSpec, Semantic};
use crate::rip::capture::CaptureFile;
use crate::shader::{ShaderInfo, ShaderStage};

/// Directory next to the capture directory where the ripper dumps shaders.
const SHADER_DIR: &str = "Shaders";

/// Select the attributes with `semantic` that feed the vertex program.
///
/// Without a vertex program every matching attribute counts as used. With
/// one, only indices it declares survive, and a semantic it never declares
/// yields nothing.
pub fn resolve_used<'a>(
    attributes: &'a [AttributeSpec],
    vertex_shader: Option<&ShaderInfo>,
    semantic: &Semantic,
) -> Vec<&'a AttributeSpec> {
    let matching = attributes.iter().filter(|a| a.semantic == *semantic);

    match vertex_shader {
        None => matching.collect(),
        Some(shader) => matching
            .filter(|a| shader.uses(semantic, a.semantic_index))
            .collect(),
    }
}

impl CaptureFile {
    /// Attributes with `semantic` that the vertex program consumes.
    pub fn used_attributes(&self, semantic: &Semantic) -> Vec<&AttributeSpec> {
        resolve_used(&self.attributes, self.vertex_shader.as_ref(), semantic)
    }

    /// True if the capture names textures and the pixel program (if known)
    /// samples at least one of them.
    pub fn has_textures(&self) -> bool {
        let samples = self
            .fragment_shader
            .as_ref()
            .map_or(true, |shader| !shader.used_samplers.is_empty());
        samples && !self.texture_names.is_empty()
    }

    /// Directories searched for shader listings, in order.
    pub fn shader_search_dirs(&self) -> Vec<PathBuf> {
        let dir = self.source_dir.as_deref().unwrap_or(Path::new(""));
        vec![dir.to_path_buf(), dir.join("..").join(SHADER_DIR)]
    }

    /// Attach a scanned listing as the vertex or pixel program.
    pub fn attach_shader(&mut self, shader: ShaderInfo) {
        match shader.stage() {
            ShaderStage::Vertex => self.vertex_shader = Some(shader),
            ShaderStage::Pixel => self.fragment_shader = Some(shader),
        }
    }

    /// Locate, scan and attach the listings named by the capture.
    ///
    /// For each name the first existing file in [`Self::shader_search_dirs`]
    /// is scanned; later directories are not tried even if that file turns
    /// out not to be a listing. Returns the number of listings attached.
    pub fn attach_shaders(&mut self) -> usize {
        let dirs = self.shader_search_dirs();
        let mut attached = 0;

        for name in self.shader_names.clone() {
            let Some(path) = dirs.iter().map(|d| d.join(&name)).find(|p| p.is_file()) else {
                log::warn!("Shader listing {} not found", name);
                continue;
            };

            match ShaderInfo::from_file(&path) {
                Ok(Some(shader)) => {
                    log::info!(
                        "Attached {} as {} program",
                        path.display(),
                        match shader.stage() {
                            ShaderStage::Vertex => "vertex",
                            ShaderStage::Pixel => "pixel",
                        }
                    );
                    self.attach_shader(shader);
                    attached += 1;
                }
                Ok(None) => {
                    log::warn!("{} is not a shader assembly listing", path.display());
                }
                Err(e) => {
                    log::warn!("Failed to read shader {}: {}", path.display(), e);
                }
            }
        }

        attached
    }
}
