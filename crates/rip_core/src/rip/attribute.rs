//! Vertex attribute channels and their per-vertex decoding.
//!
//! Every attribute in a capture describes a slice of the fixed-size vertex
//! record: where it starts, how many bytes it covers and the type of each
//! 4-byte component inside it.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

/// Size in bytes of every component in a vertex record.
pub const COMPONENT_SIZE: usize = 4;

/// Semantic tag of a vertex attribute.
///
/// Known tags get their own variant so resolver and conversion logic can
/// match on them exhaustively; anything else is carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Semantic {
    Position,
    Normal,
    TexCoord,
    Color,
    BlendIndices,
    BlendWeight,
    /// Any other tag, kept exactly as written.
    Other(String),
}

impl Semantic {
    /// Map a semantic name to its tag. Matching is exact (case-sensitive).
    pub fn from_name(name: &str) -> Self {
        match name {
            "POSITION" => Semantic::Position,
            "NORMAL" => Semantic::Normal,
            "TEXCOORD" => Semantic::TexCoord,
            "COLOR" => Semantic::Color,
            "BLENDINDICES" => Semantic::BlendIndices,
            "BLENDWEIGHT" => Semantic::BlendWeight,
            other => Semantic::Other(other.to_string()),
        }
    }

    /// The name as it appears in captures and shader declarations.
    pub fn name(&self) -> &str {
        match self {
            Semantic::Position => "POSITION",
            Semantic::Normal => "NORMAL",
            Semantic::TexCoord => "TEXCOORD",
            Semantic::Color => "COLOR",
            Semantic::BlendIndices => "BLENDINDICES",
            Semantic::BlendWeight => "BLENDWEIGHT",
            Semantic::Other(name) => name,
        }
    }
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Storage type of one 4-byte component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Float32,
    UInt32,
    Int32,
}

impl ComponentType {
    /// Map a type code from the attribute table.
    ///
    /// Format quirk: codes other than 0, 1 and 2 are read as `UInt32`.
    /// Older ripper versions emit such codes and existing tooling reads them
    /// this way, so the fallback has to stay.
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => ComponentType::Float32,
            2 => ComponentType::Int32,
            _ => ComponentType::UInt32,
        }
    }

    /// Decode one little-endian component. `bytes` must hold 4 bytes.
    pub fn decode(self, bytes: &[u8]) -> Value {
        match self {
            ComponentType::Float32 => Value::Float(LittleEndian::read_f32(bytes)),
            ComponentType::UInt32 => Value::UInt(LittleEndian::read_u32(bytes)),
            ComponentType::Int32 => Value::Int(LittleEndian::read_i32(bytes)),
        }
    }
}

/// One decoded component value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Float(f32),
    UInt(u32),
    Int(i32),
}

impl Value {
    /// Numeric value as f64 (exact for every variant).
    pub fn to_f64(self) -> f64 {
        match self {
            Value::Float(v) => v as f64,
            Value::UInt(v) => v as f64,
            Value::Int(v) => v as f64,
        }
    }

    /// Interpret the value as a bone palette index.
    ///
    /// Negative values and non-integral floats are not valid indices.
    pub fn to_bone_index(self) -> Option<u32> {
        match self {
            Value::UInt(v) => Some(v),
            Value::Int(v) => u32::try_from(v).ok(),
            Value::Float(v) => {
                if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f32 {
                    Some(v as u32)
                } else {
                    None
                }
            }
        }
    }
}

/// Decode a tuple of components laid out back to back in `bytes`.
///
/// Returns `None` when `bytes` is shorter than the components require.
pub fn decode_tuple(components: &[ComponentType], bytes: &[u8]) -> Option<Vec<Value>> {
    let needed = components.len() * COMPONENT_SIZE;
    let span = bytes.get(..needed)?;
    Some(
        span.chunks_exact(COMPONENT_SIZE)
            .zip(components)
            .map(|(chunk, ty)| ty.decode(chunk))
            .collect(),
    )
}

/// One vertex attribute channel from a capture's attribute table.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpec {
    /// Semantic tag (POSITION, NORMAL, ...)
    pub semantic: Semantic,

    /// Disambiguates channels that share a semantic
    pub semantic_index: u32,

    /// Start of the attribute within the vertex record
    pub byte_offset: u32,

    /// Size of the attribute within the vertex record
    pub byte_size: u32,

    /// Type of each component, one entry per item
    pub components: Vec<ComponentType>,

    /// Decoded components of all vertices, `items()` values per vertex
    values: Vec<Value>,

    vertex_count: usize,
}

impl AttributeSpec {
    /// Create an attribute definition with no vertex data yet.
    pub fn new(
        semantic: Semantic,
        semantic_index: u32,
        byte_offset: u32,
        byte_size: u32,
        components: Vec<ComponentType>,
    ) -> Self {
        Self {
            semantic,
            semantic_index,
            byte_offset,
            byte_size,
            components,
            values: Vec::new(),
            vertex_count: 0,
        }
    }

    /// Number of components per vertex.
    pub fn items(&self) -> usize {
        self.components.len()
    }

    /// Exclusive end offset of the attribute within the vertex record.
    pub fn byte_end(&self) -> u64 {
        self.byte_offset as u64 + self.byte_size as u64
    }

    /// Number of vertices decoded so far.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// True if every component is stored as float32.
    pub fn is_float(&self) -> bool {
        self.components.iter().all(|c| *c == ComponentType::Float32)
    }

    /// Decode this attribute's span of one vertex record and append it.
    ///
    /// Returns `false` (and appends nothing) if the record is too short.
    pub fn read_vertex(&mut self, record: &[u8]) -> bool {
        let start = self.byte_offset as usize;
        let Some(span) = record.get(start..) else {
            return false;
        };
        match decode_tuple(&self.components, span) {
            Some(tuple) => {
                self.values.extend(tuple);
                self.vertex_count += 1;
                true
            }
            None => false,
        }
    }

    /// Raw components of one vertex, or `None` past the last vertex.
    pub fn vertex(&self, index: usize) -> Option<&[Value]> {
        if index >= self.vertex_count {
            return None;
        }
        let items = self.items();
        self.values.get(index * items..(index + 1) * items)
    }

    /// Iterate over the raw component tuples in vertex order.
    pub fn tuples(&self) -> impl Iterator<Item = &[Value]> + '_ {
        (0..self.vertex_count).filter_map(move |i| self.vertex(i))
    }

    /// Project every vertex to at most `arity` float components.
    ///
    /// If the leading `arity` components are all float32 they pass through
    /// untouched and `divisor` is ignored. Otherwise every projected
    /// component is converted and divided by `divisor`. Attributes with fewer
    /// than `arity` items yield shorter tuples.
    pub fn as_floats(&self, arity: usize, divisor: f64) -> Vec<Vec<f32>> {
        let take = arity.min(self.items());
        let passthrough = self.components[..take]
            .iter()
            .all(|c| *c == ComponentType::Float32);

        self.tuples()
            .map(|tuple| {
                tuple[..take]
                    .iter()
                    .map(|&value| match value {
                        Value::Float(v) if passthrough => v,
                        other => (other.to_f64() / divisor) as f32,
                    })
                    .collect()
            })
            .collect()
    }
}
