//! Capture import driver.
//!
//! Ties the pieces together for one file: load, optionally resolve against
//! the shader listings, convert, and hand the result to a [`MeshSink`].
//! The work is split in two so that batches can run the expensive part in
//! parallel:
//!
//! - [`prepare_import`] is pure (reads files, touches no sink) and `Send`.
//! - [`PreparedImport::emit`] pushes the converted channels into a sink.
//!
//! # Example
//!
//! ```ignore
//! use rip_core::{import_batch, ImportSettings, MeshCollector};
//!
//! let options = ImportSettings::default().to_options()?;
//! let mut meshes = MeshCollector::new();
//! let report = import_batch(&paths, &options, &mut meshes);
//! println!("{} imported, {} failed", report.imported.len(), report.failed.len());
//! ```

use std::path::{Path, PathBuf};

use rip_math::OrientationError;
use thiserror::Error;

use crate::convert::{convert, ImportOptions, ImportSettings, MeshChannels};
use crate::mesh::{MeshSink, TextureSlot};
use crate::rip::{load_rip, CaptureFile, LoadError};

/// Errors that abort the import of one capture.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Invalid import orientation: {0}")]
    Orientation(#[from] OrientationError),
}

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// A converted capture, ready to be handed to a sink.
#[derive(Clone, Debug)]
pub struct PreparedImport {
    /// Mesh name (the capture's file name)
    pub name: String,

    /// Capture the mesh came from
    pub path: PathBuf,

    pub channels: MeshChannels,

    /// Textures to attach; empty when the draw call samples none
    pub textures: Vec<TextureSlot>,

    pub shader_names: Vec<String>,
}

impl PreparedImport {
    /// Convert an already loaded capture.
    ///
    /// Returns `None` when `skip_untextured` is set and the capture has no
    /// sampled textures.
    pub fn from_capture(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        mut capture: CaptureFile,
        options: &ImportOptions,
    ) -> Option<Self> {
        if options.use_shaders {
            capture.attach_shaders();
        }

        let has_textures = capture.has_textures();
        if options.skip_untextured && !has_textures {
            return None;
        }

        let channels = convert(&capture, &options.conversion);
        let textures = if has_textures {
            texture_slots(&capture)
        } else {
            Vec::new()
        };

        Some(Self {
            name: name.into(),
            path: path.into(),
            channels,
            textures,
            shader_names: capture.shader_names,
        })
    }

    /// Hand every channel to `sink` and return the new mesh's handle.
    pub fn emit<S: MeshSink>(&self, sink: &mut S) -> S::Handle {
        let channels = &self.channels;
        let mesh = sink.build_mesh(&self.name, &channels.positions, &channels.faces);

        if let Some(normals) = &channels.normals {
            sink.set_custom_normals(&mesh, normals);
        }
        for (i, uvs) in channels.uv_channels.iter().enumerate() {
            sink.add_uv_channel(&mesh, &MeshChannels::uv_channel_name(i), uvs);
        }
        for color in &channels.colors {
            sink.add_color_channel(&mesh, &color.name, &color.values);
        }
        for group in &channels.weight_groups {
            sink.add_weight_group(&mesh, &group.name(), &group.weights);
        }
        if !self.textures.is_empty() {
            sink.attach_textures(&mesh, &self.textures);
        }
        if !self.shader_names.is_empty() {
            sink.set_shader_names(&mesh, &self.shader_names);
        }

        mesh
    }
}

/// Resolve the capture's texture names. Only the first slot is enabled.
fn texture_slots(capture: &CaptureFile) -> Vec<TextureSlot> {
    capture
        .texture_names
        .iter()
        .enumerate()
        .map(|(i, name)| TextureSlot {
            name: name.clone(),
            path: capture.texture_path(name),
            enabled: i == 0,
        })
        .collect()
}

/// Load and convert one capture without touching any sink.
pub fn prepare_import<P: AsRef<Path>>(
    path: P,
    options: &ImportOptions,
) -> ImportResult<Option<PreparedImport>> {
    let path = path.as_ref();
    let capture = load_rip(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "capture".to_string());

    let prepared = PreparedImport::from_capture(name, path, capture, options);
    if prepared.is_none() {
        log::debug!("{} has no sampled textures", path.display());
    }
    Ok(prepared)
}

/// Import one capture into `sink`.
///
/// Returns `Ok(None)` if the capture was skipped as untextured.
pub fn import_rip<P: AsRef<Path>, S: MeshSink>(
    path: P,
    options: &ImportOptions,
    sink: &mut S,
) -> ImportResult<Option<S::Handle>> {
    Ok(prepare_import(path, options)?.map(|prepared| prepared.emit(sink)))
}

/// Import one capture using raw user settings.
pub fn import_with_settings<P: AsRef<Path>, S: MeshSink>(
    path: P,
    settings: &ImportSettings,
    sink: &mut S,
) -> ImportResult<Option<S::Handle>> {
    let options = settings.to_options()?;
    import_rip(path, &options, sink)
}

/// Outcome of a batch import.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub imported: Vec<PathBuf>,

    /// Captures skipped because they have no sampled textures
    pub skipped: Vec<PathBuf>,

    pub failed: Vec<(PathBuf, ImportError)>,
}

impl BatchReport {
    /// File the result of one import, logging skips and failures.
    pub fn record<T>(&mut self, path: &Path, result: ImportResult<Option<T>>) -> Option<T> {
        match result {
            Ok(Some(value)) => {
                self.imported.push(path.to_path_buf());
                Some(value)
            }
            Ok(None) => {
                log::info!("Skipped untextured capture {}", path.display());
                self.skipped.push(path.to_path_buf());
                None
            }
            Err(e) => {
                log::warn!("Failed to import {}: {}", path.display(), e);
                self.failed.push((path.to_path_buf(), e));
                None
            }
        }
    }

    /// True if no file failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.imported.len() + self.skipped.len() + self.failed.len()
    }
}

/// Import every capture in `paths`, in order, continuing past failures.
pub fn import_batch<P: AsRef<Path>, S: MeshSink>(
    paths: &[P],
    options: &ImportOptions,
    sink: &mut S,
) -> BatchReport {
    let mut report = BatchReport::default();
    for path in paths {
        let path = path.as_ref();
        report.record(path, import_rip(path, options, sink));
    }
    report
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::mesh::MeshCollector;
    use crate::rip::test_util::{CaptureBuilder, TestAttribute};
    use rip_math::{Axis, Vec2};

    fn textured_capture() -> CaptureBuilder {
        CaptureBuilder::new()
            .face([0, 1, 2])
            .texture("diffuse.dds")
            .texture("normal.dds")
            .shader("vs.txt")
            .attribute(TestAttribute::floats(
                "POSITION",
                0,
                &[&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]],
            ))
            .attribute(TestAttribute::floats(
                "TEXCOORD",
                0,
                &[&[0.0, 0.0], &[1.0, 0.0], &[0.0, 1.0]],
            ))
            .attribute(TestAttribute::uints("BLENDINDICES", 0, &[&[1], &[1], &[2]]))
            .attribute(TestAttribute::floats("BLENDWEIGHT", 0, &[&[1.0], &[0.5], &[1.0]]))
    }

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn write(dir: &Path, name: &str, builder: &CaptureBuilder) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, builder.build()).unwrap();
        path
    }

    #[test]
    fn test_import_rip_emits_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "Mesh_0001.rip", &textured_capture());

        let mut sink = MeshCollector::new();
        let handle = import_rip(&path, &ImportOptions::default(), &mut sink)
            .unwrap()
            .unwrap();

        let mesh = &sink.meshes()[handle];
        assert_eq!(mesh.name, "Mesh_0001.rip");
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.uv_channel("uv0").unwrap()[1], Vec2::new(1.0, 0.0));
        assert_eq!(mesh.vertex_group("blendweight1").unwrap().len(), 2);
        assert_eq!(mesh.vertex_group("blendweight2").unwrap()[&2], 1.0);
        assert_eq!(mesh.shader_names, vec!["vs.txt".to_string()]);

        assert_eq!(mesh.textures.len(), 2);
        assert!(mesh.textures[0].enabled);
        assert!(!mesh.textures[1].enabled);
        assert_eq!(mesh.textures[0].path, dir.path().join("diffuse.dds"));
    }

    #[test]
    fn test_skip_untextured() {
        let dir = tempfile::tempdir().unwrap();
        let builder = CaptureBuilder::new()
            .face([0, 1, 2])
            .attribute(TestAttribute::floats("POSITION", 0, &[&[0.0; 3], &[1.0; 3], &[2.0; 3]]));
        let path = write(dir.path(), "plain.rip", &builder);

        let options = ImportOptions {
            skip_untextured: true,
            ..Default::default()
        };
        let mut sink = MeshCollector::new();
        assert!(import_rip(&path, &options, &mut sink).unwrap().is_none());
        assert!(sink.is_empty());

        // Without the switch the mesh is imported, just without textures
        let handle = import_rip(&path, &ImportOptions::default(), &mut sink)
            .unwrap()
            .unwrap();
        assert!(sink.meshes()[handle].textures.is_empty());
    }

    #[test]
    fn test_textures_dropped_when_pixel_shader_samples_nothing() {
        init_logger();
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "Mesh_0002.rip", &textured_capture().shader("ps.txt"));
        fs::write(dir.path().join("ps.txt"), "ps_2_0\nmov oC0, c0\n").unwrap();

        let options = ImportOptions {
            use_shaders: true,
            ..Default::default()
        };
        let prepared = prepare_import(&path, &options).unwrap().unwrap();
        assert!(prepared.textures.is_empty());
        assert_eq!(prepared.shader_names.len(), 2);
    }

    #[test]
    fn test_import_with_settings_rejects_bad_axes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "Mesh_0003.rip", &textured_capture());
        let settings = ImportSettings {
            axis_forward: Axis::Z,
            axis_up: Axis::NegZ,
            ..Default::default()
        };

        let mut sink = MeshCollector::new();
        let err = import_with_settings(&path, &settings, &mut sink).unwrap_err();
        assert!(matches!(err, ImportError::Orientation(_)));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_batch_continues_after_failure() {
        init_logger();
        let dir = tempfile::tempdir().unwrap();
        let good = write(dir.path(), "a.rip", &textured_capture());
        let bad = dir.path().join("b.rip");
        fs::write(&bad, [0u8; 8]).unwrap();
        let missing = dir.path().join("missing.rip");
        let also_good = write(dir.path(), "c.rip", &textured_capture());

        let mut sink = MeshCollector::new();
        let report = import_batch(
            &[&good, &bad, &missing, &also_good],
            &ImportOptions::default(),
            &mut sink,
        );

        assert_eq!(report.imported, vec![good, also_good]);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].0, bad);
        assert!(report.failed[0].1.to_string().contains("b.rip"));
        assert!(!report.is_success());
        assert_eq!(report.total(), 4);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_batch_records_skipped_captures() {
        init_logger();
        let dir = tempfile::tempdir().unwrap();
        let plain = CaptureBuilder::new()
            .face([0, 1, 2])
            .attribute(TestAttribute::floats("POSITION", 0, &[&[0.0; 3], &[1.0; 3], &[2.0; 3]]));
        let skipped = write(dir.path(), "plain.rip", &plain);
        let textured = write(dir.path(), "textured.rip", &textured_capture());

        let options = ImportOptions {
            skip_untextured: true,
            ..Default::default()
        };
        let mut sink = MeshCollector::new();
        let report = import_batch(&[&skipped, &textured], &options, &mut sink);

        assert_eq!(report.skipped, vec![skipped]);
        assert_eq!(report.imported, vec![textured]);
        assert!(report.is_success());
        assert_eq!(sink.len(), 1);
    }
}
