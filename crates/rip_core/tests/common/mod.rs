//! Minimal capture writer shared by the integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};

/// An attribute made of float32 components only.
pub struct FloatAttribute {
    pub semantic: &'static str,
    pub index: u32,
    pub data: Vec<Vec<f32>>,
}

pub fn attr(semantic: &'static str, index: u32, data: &[&[f32]]) -> FloatAttribute {
    FloatAttribute {
        semantic,
        index,
        data: data.iter().map(|v| v.to_vec()).collect(),
    }
}

/// Serialize a version 4 capture.
pub fn capture_bytes(
    faces: &[[u32; 3]],
    attributes: &[FloatAttribute],
    textures: &[&str],
    shaders: &[&str],
) -> Vec<u8> {
    let vertex_count = attributes.first().map_or(0, |a| a.data.len());
    let items: Vec<usize> = attributes
        .iter()
        .map(|a| a.data.first().map_or(0, Vec::len))
        .collect();
    let record_size: usize = items.iter().sum::<usize>() * 4;

    let mut out = Vec::new();
    for word in [
        0xDEAD_C0DE,
        4,
        faces.len() as u32,
        vertex_count as u32,
        record_size as u32,
        textures.len() as u32,
        shaders.len() as u32,
        attributes.len() as u32,
    ] {
        out.write_u32::<LittleEndian>(word).unwrap();
    }

    let mut offset = 0;
    for (attr, &n) in attributes.iter().zip(&items) {
        out.extend_from_slice(attr.semantic.as_bytes());
        out.push(0);
        for word in [attr.index, offset, n as u32 * 4, n as u32] {
            out.write_u32::<LittleEndian>(word).unwrap();
        }
        for _ in 0..n {
            out.write_u32::<LittleEndian>(0).unwrap();
        }
        offset += n as u32 * 4;
    }

    for name in textures.iter().chain(shaders) {
        out.extend_from_slice(name.as_bytes());
        out.push(0);
    }

    for face in faces {
        for &index in face {
            out.write_u32::<LittleEndian>(index).unwrap();
        }
    }

    for vertex in 0..vertex_count {
        for attr in attributes {
            for &value in &attr.data[vertex] {
                out.write_f32::<LittleEndian>(value).unwrap();
            }
        }
    }

    out
}

pub fn write_file(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// A textured triangle with two UV sets.
pub fn textured_triangle(shaders: &[&str]) -> Vec<u8> {
    capture_bytes(
        &[[0, 1, 2]],
        &[
            attr("POSITION", 0, &[&[0.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &[0.0, 0.0, -1.0]]),
            attr("TEXCOORD", 0, &[&[0.0, 0.0], &[1.0, 0.0], &[0.0, 1.0]]),
            attr("TEXCOORD", 1, &[&[0.5, 0.5], &[0.5, 0.5], &[0.5, 0.5]]),
        ],
        &["albedo.dds"],
        shaders,
    )
}
