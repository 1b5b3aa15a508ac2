//! Geometry reconstruction from resolved capture attributes.
//!
//! Every function here is a pure transform of `(CaptureFile,
//! ConversionConfig)`; attribute data is never modified in place.

use std::collections::BTreeMap;

use rip_math::{Mat3Ext, Vec2, Vec3};

use crate::convert::config::{AxisScale, ConversionConfig};
use crate::rip::{AttributeSpec, CaptureFile, Semantic, Value};

/// Divisor applied to integer-encoded vertex colors.
pub const COLOR_INT_DIVISOR: f64 = 255.0;

/// A named per-vertex RGB channel.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorChannel {
    pub name: String,
    pub values: Vec<Vec3>,
}

/// Sparse skinning weights of one bone.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightGroup {
    /// Bone palette index
    pub bone: u32,

    /// Vertex index -> weight, zero weights omitted
    pub weights: BTreeMap<u32, f32>,
}

impl WeightGroup {
    /// Vertex group name, e.g. `blendweight3`.
    pub fn name(&self) -> String {
        format!("blendweight{}", self.bone)
    }
}

/// Everything reconstructed from one capture.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshChannels {
    /// Oriented vertex positions
    pub positions: Vec<Vec3>,

    /// Triangles in output winding order
    pub faces: Vec<[u32; 3]>,

    /// Oriented custom normals, if requested and present
    pub normals: Option<Vec<Vec3>>,

    /// UV sets in order, one `Vec2` per vertex each
    pub uv_channels: Vec<Vec<Vec2>>,

    /// Color and alpha layers
    pub colors: Vec<ColorChannel>,

    /// One group per bone, ordered by bone index
    pub weight_groups: Vec<WeightGroup>,
}

impl MeshChannels {
    /// Name of UV channel `index`.
    pub fn uv_channel_name(index: usize) -> String {
        format!("uv{}", index)
    }
}

/// Run the whole conversion for one capture.
pub fn convert(capture: &CaptureFile, config: &ConversionConfig) -> MeshChannels {
    MeshChannels {
        positions: positions(capture, config),
        faces: oriented_faces(capture, config),
        normals: if config.use_normals {
            normals(capture, config)
        } else {
            None
        },
        uv_channels: uv_channels(capture, config),
        colors: color_channels(capture),
        weight_groups: if config.use_weights {
            weight_groups(capture)
        } else {
            Vec::new()
        },
    }
}

/// Oriented vertex positions.
///
/// Format quirk: legacy dumps may lack a POSITION tag entirely, in which
/// case the first declared attribute holds the positions.
pub fn positions(capture: &CaptureFile, config: &ConversionConfig) -> Vec<Vec3> {
    let source = capture
        .used_attributes(&Semantic::Position)
        .first()
        .copied()
        .or_else(|| capture.attributes.first());

    let Some(source) = source else {
        log::warn!("Capture has no attributes; positions default to the origin");
        return vec![Vec3::ZERO; capture.vertex_count];
    };

    let raw: Vec<Vec3> = source.as_floats(3, 1.0).iter().map(|v| to_vec3(v)).collect();
    config.orientation.transform_all(&raw)
}

/// True if triangle order must be reversed for this configuration.
///
/// Mirroring already flips winding, so an explicit flip request cancels it.
pub fn needs_winding_flip(config: &ConversionConfig) -> bool {
    config.orientation.is_mirroring() != config.flip_winding
}

/// Faces in output winding order.
pub fn oriented_faces(capture: &CaptureFile, config: &ConversionConfig) -> Vec<[u32; 3]> {
    if needs_winding_flip(config) {
        capture.faces.iter().map(|f| [f[1], f[0], f[2]]).collect()
    } else {
        capture.faces.clone()
    }
}

/// Scaled and oriented custom normals from the first used NORMAL attribute.
pub fn normals(capture: &CaptureFile, config: &ConversionConfig) -> Option<Vec<Vec3>> {
    let source = *capture.used_attributes(&Semantic::Normal).first()?;
    let scale = &config.normal_scale;

    let normals = source
        .as_floats(3, config.normal_int_divisor as f64)
        .iter()
        .map(|v| {
            let raw = to_vec3(v);
            let scaled = Vec3::new(
                scale[0].apply(raw.x),
                scale[1].apply(raw.y),
                scale[2].apply(raw.z),
            );
            config.orientation * scaled
        })
        .collect();

    Some(normals)
}

/// UV channels from all used TEXCOORD attributes.
///
/// The per-vertex components of every attribute (up to four each) are
/// concatenated and re-split into consecutive pairs, one channel per pair.
/// An odd trailing component is paired with 0.0.
pub fn uv_channels(capture: &CaptureFile, config: &ConversionConfig) -> Vec<Vec<Vec2>> {
    let sources = capture.used_attributes(&Semantic::TexCoord);
    if sources.is_empty() {
        return Vec::new();
    }

    let divisor = config.uv_int_divisor as f64;
    let per_vertex = concat_per_vertex(&sources, |attr| attr.as_floats(4, divisor));

    let component_count = per_vertex.first().map_or(0, Vec::len);
    let channel_count = (component_count + 1) / 2;
    let [su, sv] = config.uv_scale;

    let mut channels = vec![Vec::with_capacity(per_vertex.len()); channel_count];
    for components in &per_vertex {
        for (channel, pair) in channels.iter_mut().zip(components.chunks(2)) {
            let u = pair[0];
            let v = pair.get(1).copied().unwrap_or(0.0);
            channel.push(scale_uv(&su, &sv, u, v));
        }
    }

    channels
}

fn scale_uv(su: &AxisScale, sv: &AxisScale, u: f32, v: f32) -> Vec2 {
    Vec2::new(su.apply(u), sv.apply(v))
}

/// Color (and alpha) layers from used COLOR attributes with 3+ components.
///
/// Layers are named after the attribute's position among used COLOR
/// attributes: `color0`, `alpha0`, `color1`, ...
pub fn color_channels(capture: &CaptureFile) -> Vec<ColorChannel> {
    let mut channels = Vec::new();

    for (index, attr) in capture.used_attributes(&Semantic::Color).into_iter().enumerate() {
        if attr.items() < 3 {
            continue;
        }

        let data = attr.as_floats(4, COLOR_INT_DIVISOR);
        channels.push(ColorChannel {
            name: format!("color{}", index),
            values: data.iter().map(|v| Vec3::new(v[0], v[1], v[2])).collect(),
        });

        if attr.items() == 4 {
            channels.push(ColorChannel {
                name: format!("alpha{}", index),
                values: data.iter().map(|v| Vec3::splat(v[3])).collect(),
            });
        }
    }

    channels
}

/// Per-bone vertex weights from used BLENDINDICES / BLENDWEIGHT attributes.
///
/// Indices and weights are paired component-wise up to the shorter of the
/// two. Zero weights are omitted, as are indices that are not valid bone
/// numbers (negative or fractional).
pub fn weight_groups(capture: &CaptureFile) -> Vec<WeightGroup> {
    let index_attrs = capture.used_attributes(&Semantic::BlendIndices);
    let weight_attrs = capture.used_attributes(&Semantic::BlendWeight);
    if index_attrs.is_empty() || weight_attrs.is_empty() {
        return Vec::new();
    }

    let indices = concat_per_vertex(&index_attrs, |attr| {
        attr.tuples().map(<[Value]>::to_vec).collect()
    });
    let weights = concat_per_vertex(&weight_attrs, |attr| attr.as_floats(4, 1.0));

    let mut groups: BTreeMap<u32, BTreeMap<u32, f32>> = BTreeMap::new();
    for (vertex, (bones, weights)) in indices.iter().zip(&weights).enumerate() {
        for (bone, &weight) in bones.iter().zip(weights) {
            if weight == 0.0 {
                continue;
            }
            let Some(bone) = bone.to_bone_index() else {
                log::debug!("Skipping invalid bone index {:?} at vertex {}", bone, vertex);
                continue;
            };
            groups.entry(bone).or_default().insert(vertex as u32, weight);
        }
    }

    groups
        .into_iter()
        .map(|(bone, weights)| WeightGroup { bone, weights })
        .collect()
}

/// Concatenate each vertex's tuples across several attributes.
fn concat_per_vertex<T, F>(attrs: &[&AttributeSpec], extract: F) -> Vec<Vec<T>>
where
    F: Fn(&AttributeSpec) -> Vec<Vec<T>>,
{
    let mut columns = attrs.iter().map(|attr| extract(*attr));
    let Some(first) = columns.next() else {
        return Vec::new();
    };

    let mut rows = first;
    for column in columns {
        for (row, tuple) in rows.iter_mut().zip(column) {
            row.extend(tuple);
        }
    }
    rows
}

/// Build a Vec3 from up to three components, padding with zeros.
fn to_vec3(components: &[f32]) -> Vec3 {
    let get = |i: usize| components.get(i).copied().unwrap_or(0.0);
    Vec3::new(get(0), get(1), get(2))
}
