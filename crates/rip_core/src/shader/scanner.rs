//! Shader assembly listing scanner.
//!
//! Ripped draw calls come with the D3D shader bytecode disassembled into
//! text. Only two things are needed from it: the version line, which tells
//! vertex and pixel programs apart, and the `dcl_*` declarations, which say
//! which vertex inputs and samplers the program actually reads.
//!
//! # Supported Syntax
//!
//! - `vs_3_0` / `ps_2_0` version line (first instruction)
//! - `dcl_texcoord1 v3` vertex input declarations
//! - `dcl_2d s0` sampler declarations
//! - `//` and `#` comments to end of line

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::rip::Semantic;
use crate::text::decode_cp437;

/// One tokenized line: an opcode and its comma-separated operands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: String,
    pub operands: Vec<String>,
}

/// Program stage, derived from the version opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

/// What a shader listing tells us about its inputs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderInfo {
    /// Listing the info was read from, if it came from disk
    pub path: Option<PathBuf>,

    /// Version opcode, e.g. `vs_3_0`
    pub version: String,

    /// Semantic -> set of semantic indices the program declares as inputs
    pub used_attrs: BTreeMap<Semantic, BTreeSet<u32>>,

    /// Sampler register (e.g. `s0`) -> texture type name (e.g. `2d`)
    pub used_samplers: BTreeMap<String, String>,
}

impl ShaderInfo {
    /// Scan a listing on disk.
    ///
    /// Returns `Ok(None)` when the file is readable but is not a shader
    /// assembly listing.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Option<Self>> {
        let path = path.as_ref();
        let text = decode_cp437(fs::read(path)?);
        Ok(Self::parse(&text).map(|mut info| {
            info.path = Some(path.to_path_buf());
            info
        }))
    }

    /// Scan listing text. Returns `None` if the first instruction is not a
    /// `vs_N_M` / `ps_N_M` version opcode.
    pub fn parse(text: &str) -> Option<Self> {
        let instructions = tokenize(text);

        let version = instructions.first()?.opcode.clone();
        if !is_version_opcode(&version) {
            return None;
        }

        let mut info = ShaderInfo {
            path: None,
            version,
            used_attrs: BTreeMap::new(),
            used_samplers: BTreeMap::new(),
        };

        for instruction in &instructions {
            let Some(decl) = instruction.opcode.strip_prefix("dcl_") else {
                continue;
            };
            let Some(register) = instruction.operands.first() else {
                continue;
            };

            if register.starts_with('v') {
                if let Some((semantic, index)) = parse_input_decl(decl) {
                    info.used_attrs.entry(semantic).or_default().insert(index);
                }
            } else if register.starts_with('s') {
                info.used_samplers.insert(register.clone(), decl.to_string());
            }
        }

        Some(info)
    }

    /// Stage of the program, from the first letter of the version.
    pub fn stage(&self) -> ShaderStage {
        if self.version.starts_with('v') {
            ShaderStage::Vertex
        } else {
            ShaderStage::Pixel
        }
    }

    /// True if the program declares this semantic/index pair as an input.
    pub fn uses(&self, semantic: &Semantic, index: u32) -> bool {
        self.used_attrs
            .get(semantic)
            .is_some_and(|indices| indices.contains(&index))
    }
}

/// Split listing text into instructions.
///
/// Comments are cut at the first `//` or `#`, blank lines are skipped and
/// everything is lowercased before splitting.
pub fn tokenize(text: &str) -> Vec<Instruction> {
    text.lines().filter_map(tokenize_line).collect()
}

fn tokenize_line(line: &str) -> Option<Instruction> {
    let line = strip_comment(line).trim().to_lowercase();
    if line.is_empty() {
        return None;
    }

    let (opcode, rest) = match line.find(char::is_whitespace) {
        Some(split) => (&line[..split], line[split..].trim()),
        None => (line.as_str(), ""),
    };

    let operands = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(|s| s.trim().to_string()).collect()
    };

    Some(Instruction {
        opcode: opcode.to_string(),
        operands,
    })
}

fn strip_comment(line: &str) -> &str {
    let cut = [line.find("//"), line.find('#')]
        .into_iter()
        .flatten()
        .min();
    match cut {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Matches `[pv]s_<digits>_<digits>`.
fn is_version_opcode(opcode: &str) -> bool {
    let Some(rest) = opcode
        .strip_prefix("vs_")
        .or_else(|| opcode.strip_prefix("ps_"))
    else {
        return false;
    };
    match rest.split_once('_') {
        Some((major, minor)) => is_digits(major) && is_digits(minor),
        None => false,
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse the part of a declaration opcode after `dcl_`.
///
/// `texcoord1` -> (TEXCOORD, 1), `position` -> (POSITION, 0),
/// `normal_pp` -> (NORMAL, 0). The name must start with a letter; trailing
/// digits directly after the name are the index.
fn parse_input_decl(decl: &str) -> Option<(Semantic, u32)> {
    let name_len = decl
        .bytes()
        .take_while(|b| b.is_ascii_lowercase())
        .count();
    if name_len == 0 {
        return None;
    }

    let (name, rest) = decl.split_at(name_len);
    let digits_len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    let index = if digits_len == 0 {
        // Anything after the name must not start with another alphanumeric
        if rest.bytes().next().is_some_and(|b| b.is_ascii_alphanumeric()) {
            return None;
        }
        0
    } else {
        rest[..digits_len].parse().ok()?
    };

    Some((Semantic::from_name(&name.to_uppercase()), index))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX_SHADER: &str = "\
// Ripped vertex shader
    vs_3_0
    def c4, 1, 0, 0, 0
    dcl_position v0
    dcl_normal v1
    dcl_texcoord v2
    dcl_texcoord1 v3   // second uv set
    dcl_texcoord1 v4
    dcl_position o0
    dcl_texcoord o1
    mov o0, v0
";

    #[test]
    fn test_tokenize_line() {
        let instructions = tokenize("  MAD r0.xyz, v1 , C4.x,r2  # trailing\n\n   \n");
        assert_eq!(
            instructions,
            vec![Instruction {
                opcode: "mad".into(),
                operands: vec!["r0.xyz".into(), "v1".into(), "c4.x".into(), "r2".into()],
            }]
        );
    }

    #[test]
    fn test_comment_markers() {
        assert_eq!(strip_comment("mov r0, r1 // a # b"), "mov r0, r1 ");
        assert_eq!(strip_comment("mov r0, r1 # a // b"), "mov r0, r1 ");
        assert!(tokenize("# only a comment\n// another").is_empty());
    }

    #[test]
    fn test_parse_vertex_shader() {
        let info = ShaderInfo::parse(VERTEX_SHADER).unwrap();

        assert_eq!(info.version, "vs_3_0");
        assert_eq!(info.stage(), ShaderStage::Vertex);
        assert_eq!(info.used_attrs[&Semantic::Position], BTreeSet::from([0]));
        assert_eq!(info.used_attrs[&Semantic::Normal], BTreeSet::from([0]));
        assert_eq!(info.used_attrs[&Semantic::TexCoord], BTreeSet::from([0, 1]));
        assert!(info.uses(&Semantic::TexCoord, 1));
        assert!(!info.uses(&Semantic::Color, 0));
        assert!(info.used_samplers.is_empty());
    }

    #[test]
    fn test_texcoord_declaration() {
        let info = ShaderInfo::parse("vs_2_0\ndcl_texcoord1 v3").unwrap();
        assert_eq!(info.used_attrs[&Semantic::TexCoord], BTreeSet::from([1]));
    }

    #[test]
    fn test_parse_pixel_shader_samplers() {
        let info = ShaderInfo::parse("ps_2_0\ndcl_2d s0\ndcl_cube s1\ndcl t0.xy\ntexld r0, t0, s0").unwrap();

        assert_eq!(info.stage(), ShaderStage::Pixel);
        assert_eq!(info.used_samplers["s0"], "2d");
        assert_eq!(info.used_samplers["s1"], "cube");
        assert!(info.used_attrs.is_empty());
    }

    #[test]
    fn test_missing_version_is_not_a_shader() {
        assert!(ShaderInfo::parse("mov r0, v0\nvs_3_0").is_none());
        assert!(ShaderInfo::parse("").is_none());
        assert!(ShaderInfo::parse("// nothing here\n").is_none());
        assert!(ShaderInfo::parse("vs_3\ndcl_position v0").is_none());
        assert!(ShaderInfo::parse("xs_3_0").is_none());
    }

    #[test]
    fn test_uppercase_listing() {
        let info = ShaderInfo::parse("VS_1_1\nDCL_COLOR1 V5").unwrap();
        assert_eq!(info.version, "vs_1_1");
        assert!(info.uses(&Semantic::Color, 1));
    }

    #[test]
    fn test_declaration_name_patterns() {
        assert_eq!(parse_input_decl("position"), Some((Semantic::Position, 0)));
        assert_eq!(parse_input_decl("blendweight"), Some((Semantic::BlendWeight, 0)));
        assert_eq!(parse_input_decl("texcoord7_centroid"), Some((Semantic::TexCoord, 7)));
        assert_eq!(parse_input_decl("normal_pp"), Some((Semantic::Normal, 0)));
        assert_eq!(
            parse_input_decl("tangent"),
            Some((Semantic::Other("TANGENT".into()), 0))
        );
        assert_eq!(parse_input_decl("2d"), None);
        assert_eq!(parse_input_decl(""), None);
    }

    #[test]
    fn test_duplicate_declarations_are_idempotent() {
        let info = ShaderInfo::parse("vs_3_0\ndcl_color v0\ndcl_color v0\ndcl_color0 v1").unwrap();
        assert_eq!(info.used_attrs[&Semantic::Color], BTreeSet::from([0]));
    }

    #[test]
    fn test_declaration_without_operands_ignored() {
        let info = ShaderInfo::parse("vs_3_0\ndcl_position\ndcl_normal r0").unwrap();
        assert!(info.used_attrs.is_empty());
    }
}
