//! Binary `.rip` capture parser.
//!
//! Layout (all integers little-endian u32):
//!
//! - magic `0xDEADC0DE`, version `4`
//! - face count, vertex count, vertex record size, texture count,
//!   shader count, attribute count
//! - attribute table: semantic (NUL-terminated), semantic index, byte offset,
//!   byte size, item count, then one type code per item
//! - texture names, shader names (NUL-terminated, code page 437)
//! - faces as index triples
//! - vertex records of exactly `vertex record size` bytes each
//!
//! Sections are read strictly in that order; any short read aborts the
//! whole parse.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use thiserror::Error;

use crate::rip::attribute::{AttributeSpec, ComponentType, Semantic, COMPONENT_SIZE};
use crate::rip::capture::{CaptureFile, RipHeader};
use crate::text::decode_cp437;

/// Magic number at the start of every capture.
pub const RIP_MAGIC: u32 = 0xDEAD_C0DE;

/// The only capture version understood by this parser.
pub const RIP_VERSION: u32 = 4;

/// Upper bound for speculative allocations driven by header counts.
const MAX_PREALLOC: usize = 1 << 16;

/// Errors that make a capture unreadable.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid file magic: expected {expected:#010X}, found {found:#010X}")]
    BadMagic { expected: u32, found: u32 },

    #[error("Unsupported file version: expected {expected}, found {found}")]
    UnsupportedVersion { expected: u32, found: u32 },

    #[error("Unexpected end of file while reading {section}")]
    Truncated { section: &'static str },

    #[error("Attribute {semantic} spans {byte_size} bytes but declares {items} 4-byte items")]
    AttributeSize {
        semantic: String,
        byte_size: u32,
        items: usize,
    },

    #[error("Attribute {semantic} ends at byte {end}, past the {record_size}-byte vertex record")]
    AttributeOutOfBounds {
        semantic: String,
        end: u64,
        record_size: u32,
    },

    #[error("Face {face} references vertex {index}, but the capture has {vertex_count} vertices")]
    FaceIndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// Result type for capture parsing.
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors tied to a specific capture file on disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{}: cannot open capture: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

/// Result type for loading captures from disk.
pub type LoadResult<T> = Result<T, LoadError>;

/// Load and parse a capture file.
///
/// The capture's directory is recorded so texture and shader names can be
/// resolved against it later.
pub fn load_rip<P: AsRef<Path>>(path: P) -> LoadResult<CaptureFile> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut capture = parse_rip(BufReader::new(file)).map_err(|source| LoadError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    capture.source_dir = path.parent().map(Path::to_path_buf);

    Ok(capture)
}

/// Parse a capture from any byte stream.
pub fn parse_rip<R: Read>(reader: R) -> FormatResult<CaptureFile> {
    RipReader::new(reader).read_capture()
}

/// Little-endian reader that turns short reads into `Truncated` errors.
struct RipReader<R: Read> {
    reader: R,
}

impl<R: Read> RipReader<R> {
    fn new(reader: R) -> Self {
        Self { reader }
    }

    fn read_capture(&mut self) -> FormatResult<CaptureFile> {
        let header = self.read_header()?;
        log::debug!(
            "Capture header: {} faces, {} vertices x {} bytes, {} attributes, {} textures, {} shaders",
            header.face_count,
            header.vertex_count,
            header.vertex_record_size,
            header.attribute_count,
            header.texture_count,
            header.shader_count
        );

        let mut attributes = Vec::with_capacity(capped(header.attribute_count));
        for _ in 0..header.attribute_count {
            let attribute = self.read_attribute()?;
            check_attribute_span(&attribute, header.vertex_record_size)?;
            attributes.push(attribute);
        }

        let texture_names = self.read_strings(header.texture_count, "texture names")?;
        let shader_names = self.read_strings(header.shader_count, "shader names")?;

        let vertex_count = header.vertex_count as usize;
        let faces = self.read_faces(header.face_count, vertex_count)?;
        let dropped = header.face_count as usize - faces.len();
        if dropped > 0 {
            log::debug!("Dropped {} degenerate faces", dropped);
        }

        self.read_vertices(&header, &mut attributes)?;

        Ok(CaptureFile {
            header,
            faces,
            attributes,
            texture_names,
            shader_names,
            vertex_count,
            vertex_shader: None,
            fragment_shader: None,
            source_dir: None,
        })
    }

    fn read_header(&mut self) -> FormatResult<RipHeader> {
        let magic = self.read_u32("file magic")?;
        if magic != RIP_MAGIC {
            return Err(FormatError::BadMagic {
                expected: RIP_MAGIC,
                found: magic,
            });
        }

        let version = self.read_u32("file version")?;
        if version != RIP_VERSION {
            return Err(FormatError::UnsupportedVersion {
                expected: RIP_VERSION,
                found: version,
            });
        }

        Ok(RipHeader {
            version,
            face_count: self.read_u32("header counts")?,
            vertex_count: self.read_u32("header counts")?,
            vertex_record_size: self.read_u32("header counts")?,
            texture_count: self.read_u32("header counts")?,
            shader_count: self.read_u32("header counts")?,
            attribute_count: self.read_u32("header counts")?,
        })
    }

    fn read_attribute(&mut self) -> FormatResult<AttributeSpec> {
        let section = "attribute table";
        let semantic = Semantic::from_name(&self.read_string(section)?);
        let semantic_index = self.read_u32(section)?;
        let byte_offset = self.read_u32(section)?;
        let byte_size = self.read_u32(section)?;
        let items = self.read_u32(section)?;

        let mut components = Vec::with_capacity(capped(items));
        for _ in 0..items {
            components.push(ComponentType::from_code(self.read_u32(section)?));
        }

        Ok(AttributeSpec::new(
            semantic,
            semantic_index,
            byte_offset,
            byte_size,
            components,
        ))
    }

    fn read_strings(&mut self, count: u32, section: &'static str) -> FormatResult<Vec<String>> {
        let mut strings = Vec::with_capacity(capped(count));
        for _ in 0..count {
            strings.push(self.read_string(section)?);
        }
        Ok(strings)
    }

    fn read_faces(&mut self, count: u32, vertex_count: usize) -> FormatResult<Vec<[u32; 3]>> {
        let mut faces = Vec::with_capacity(capped(count));
        for face_index in 0..count as usize {
            let face = [
                self.read_u32("faces")?,
                self.read_u32("faces")?,
                self.read_u32("faces")?,
            ];

            if let Some(&index) = face.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(FormatError::FaceIndexOutOfRange {
                    face: face_index,
                    index,
                    vertex_count,
                });
            }

            // Degenerate triangles stitch strips together in the capture
            if !is_degenerate(face) {
                faces.push(face);
            }
        }
        Ok(faces)
    }

    fn read_vertices(
        &mut self,
        header: &RipHeader,
        attributes: &mut [AttributeSpec],
    ) -> FormatResult<()> {
        let mut record = vec![0u8; header.vertex_record_size as usize];
        for _ in 0..header.vertex_count {
            self.read_bytes(&mut record, "vertex records")?;
            for attribute in attributes.iter_mut() {
                // Spans were validated against the record size up front
                if !attribute.read_vertex(&record) {
                    return Err(FormatError::AttributeOutOfBounds {
                        semantic: attribute.semantic.to_string(),
                        end: attribute.byte_end(),
                        record_size: header.vertex_record_size,
                    });
                }
            }
        }
        Ok(())
    }

    fn read_u32(&mut self, section: &'static str) -> FormatResult<u32> {
        self.reader
            .read_u32::<LittleEndian>()
            .map_err(|e| short_read(e, section))
    }

    fn read_bytes(&mut self, buf: &mut [u8], section: &'static str) -> FormatResult<()> {
        self.reader.read_exact(buf).map_err(|e| short_read(e, section))
    }

    /// Read a NUL-terminated code page 437 string.
    fn read_string(&mut self, section: &'static str) -> FormatResult<String> {
        let mut bytes = Vec::new();
        loop {
            match self.reader.read_u8().map_err(|e| short_read(e, section))? {
                0 => break,
                b => bytes.push(b),
            }
        }
        Ok(decode_cp437(bytes))
    }
}

/// True if any two indices of the triangle coincide.
pub fn is_degenerate(face: [u32; 3]) -> bool {
    face[0] == face[1] || face[1] == face[2] || face[0] == face[2]
}

fn check_attribute_span(attribute: &AttributeSpec, record_size: u32) -> FormatResult<()> {
    let items = attribute.items();
    if attribute.byte_size as u64 != (items * COMPONENT_SIZE) as u64 {
        return Err(FormatError::AttributeSize {
            semantic: attribute.semantic.to_string(),
            byte_size: attribute.byte_size,
            items,
        });
    }
    if attribute.byte_end() > record_size as u64 {
        return Err(FormatError::AttributeOutOfBounds {
            semantic: attribute.semantic.to_string(),
            end: attribute.byte_end(),
            record_size,
        });
    }
    Ok(())
}

fn short_read(err: io::Error, section: &'static str) -> FormatError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        FormatError::Truncated { section }
    } else {
        FormatError::Io(err)
    }
}

fn capped(count: u32) -> usize {
    (count as usize).min(MAX_PREALLOC)
}


#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::test_util::{CaptureBuilder, TestAttribute};
    use super::*;
    use crate::rip::attribute::Value;

    fn triangle() -> CaptureBuilder {
        CaptureBuilder::new().face([0, 1, 2]).attribute(TestAttribute::floats(
            "POSITION",
            0,
            &[&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]],
        ))
    }

    #[test]
    fn test_parse_single_triangle() {
        let capture = parse_rip(Cursor::new(triangle().build())).unwrap();

        assert_eq!(capture.faces, vec![[0, 1, 2]]);
        assert_eq!(capture.vertex_count, 3);
        assert_eq!(capture.attributes.len(), 1);

        let position = &capture.attributes[0];
        assert_eq!(position.semantic, Semantic::Position);
        assert_eq!(position.vertex_count(), 3);
        assert_eq!(
            position.vertex(1),
            Some(&[Value::Float(1.0), Value::Float(0.0), Value::Float(0.0)][..])
        );
    }

    #[test]
    fn test_header_counts_round_trip() {
        let builder = CaptureBuilder::new()
            .face([0, 1, 2])
            .face([2, 2, 5])
            .face([1, 2, 0])
            .texture("diffuse.dds")
            .shader("vs.txt")
            .shader("ps.txt")
            .attribute(TestAttribute::uints(
                "BLENDINDICES",
                0,
                &[&[0], &[1], &[2], &[3], &[4], &[5]],
            ));
        let capture = parse_rip(Cursor::new(builder.build())).unwrap();

        assert_eq!(capture.header.face_count, 3);
        assert_eq!(capture.faces.len() + capture.dropped_face_count(), 3);
        assert_eq!(capture.dropped_face_count(), 1);
        assert_eq!(capture.vertex_count, capture.header.vertex_count as usize);
        assert_eq!(capture.attributes.len(), capture.header.attribute_count as usize);
        assert_eq!(capture.texture_names, vec!["diffuse.dds"]);
        assert_eq!(capture.shader_names, vec!["vs.txt", "ps.txt"]);
    }

    #[test]
    fn test_degenerate_filter() {
        assert!(is_degenerate([2, 2, 5]));
        assert!(is_degenerate([3, 5, 3]));
        assert!(is_degenerate([1, 4, 1]));
        assert!(!is_degenerate([1, 2, 3]));
    }

    #[test]
    fn test_bad_magic() {
        let mut builder = triangle();
        builder.magic = Some(0x1234_5678);
        let err = parse_rip(Cursor::new(builder.build())).unwrap_err();

        assert!(matches!(
            err,
            FormatError::BadMagic {
                expected: RIP_MAGIC,
                found: 0x1234_5678
            }
        ));
        assert!(err.to_string().contains("0xDEADC0DE"));
    }

    #[test]
    fn test_unsupported_version() {
        let mut builder = triangle();
        builder.version = Some(3);
        let err = parse_rip(Cursor::new(builder.build())).unwrap_err();

        assert!(matches!(
            err,
            FormatError::UnsupportedVersion {
                expected: 4,
                found: 3
            }
        ));
    }

    #[test]
    fn test_truncated_vertex_buffer() {
        let mut bytes = triangle().build();
        bytes.truncate(bytes.len() - 2);
        let err = parse_rip(Cursor::new(bytes)).unwrap_err();

        assert!(matches!(
            err,
            FormatError::Truncated {
                section: "vertex records"
            }
        ));
    }

    #[test]
    fn test_truncated_string() {
        let bytes = triangle().texture("tex.dds").build();
        // Cut inside the attribute semantic string
        let err = parse_rip(Cursor::new(bytes[..34].to_vec())).unwrap_err();

        assert!(matches!(
            err,
            FormatError::Truncated {
                section: "attribute table"
            }
        ));
    }

    #[test]
    fn test_face_index_out_of_range() {
        let bytes = triangle().face([0, 1, 3]).build();
        let err = parse_rip(Cursor::new(bytes)).unwrap_err();

        assert!(matches!(
            err,
            FormatError::FaceIndexOutOfRange {
                face: 1,
                index: 3,
                vertex_count: 3
            }
        ));
    }

    #[test]
    fn test_attribute_past_record_end() {
        let mut bytes = triangle().build();
        // Header is 32 bytes, then "POSITION\0" (9), index, offset...
        let offset_pos = 32 + 9 + 4;
        bytes[offset_pos..offset_pos + 4].copy_from_slice(&4u32.to_le_bytes());
        let err = parse_rip(Cursor::new(bytes)).unwrap_err();

        assert!(matches!(
            err,
            FormatError::AttributeOutOfBounds {
                end: 16,
                record_size: 12,
                ..
            }
        ));
    }

    #[test]
    fn test_overlapping_attributes_allowed() {
        let mut bytes = CaptureBuilder::new()
            .attribute(TestAttribute::floats("POSITION", 0, &[&[1.0, 2.0, 3.0]]))
            .attribute(TestAttribute::floats("TEXCOORD", 0, &[&[0.0, 0.0]]))
            .build();
        // Rewrite TEXCOORD's offset to alias the POSITION span (bytes 4..12).
        // TEXCOORD header starts after POSITION's: 32 + 9 + 16 + 12 codes.
        let texcoord_offset = 32 + 9 + 16 + 12 + 9 + 4;
        bytes[texcoord_offset..texcoord_offset + 4].copy_from_slice(&4u32.to_le_bytes());

        let capture = parse_rip(Cursor::new(bytes)).unwrap();
        assert_eq!(
            capture.attributes[1].vertex(0),
            Some(&[Value::Float(2.0), Value::Float(3.0)][..])
        );
    }

    #[test]
    fn test_cp437_names() {
        let mut builder = triangle();
        builder.textures.push(b"caf\x82.dds".to_vec());
        let capture = parse_rip(Cursor::new(builder.build())).unwrap();

        assert_eq!(capture.texture_names, vec!["caf\u{e9}.dds"]);
    }
}
