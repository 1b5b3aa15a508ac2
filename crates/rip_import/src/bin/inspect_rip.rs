// Quick debug tool to inspect raw .rip capture data
// Run with: cargo run --release --bin inspect_rip -- <path_to.rip>

use rip_core::rip::{load_rip, ComponentType, Semantic};
use std::env;

fn component_name(ty: ComponentType) -> &'static str {
    match ty {
        ComponentType::Float32 => "f32",
        ComponentType::UInt32 => "u32",
        ComponentType::Int32 => "i32",
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <path_to.rip>", args[0]);
        std::process::exit(1);
    }

    let path = &args[1];
    println!("Loading capture: {}", path);

    let mut capture = load_rip(path)?;
    let header = &capture.header;

    println!("\nVersion: {}", header.version);
    println!("Vertices: {} x {} bytes", header.vertex_count, header.vertex_record_size);
    println!(
        "Faces: {} ({} degenerate dropped)",
        capture.faces.len(),
        capture.dropped_face_count()
    );

    println!("\n=== Attributes ({}) ===", capture.attributes.len());
    for attr in &capture.attributes {
        let types: Vec<&str> = attr.components.iter().map(|c| component_name(*c)).collect();
        println!(
            "  {}{} @ {}..{}  [{}]",
            attr.semantic,
            attr.semantic_index,
            attr.byte_offset,
            attr.byte_end(),
            types.join(", ")
        );
        if let Some(first) = attr.vertex(0) {
            println!("    v0: {:?}", first);
        }
    }

    println!("\n=== Textures ({}) ===", capture.texture_names.len());
    for name in &capture.texture_names {
        println!("  {}", name);
    }

    println!("\n=== Shaders ({}) ===", capture.shader_names.len());
    for name in &capture.shader_names {
        println!("  {}", name);
    }

    // Show which attributes the listings say are live
    if capture.attach_shaders() > 0 {
        if let Some(vs) = &capture.vertex_shader {
            println!("\nVertex program {}:", vs.version);
            for (semantic, indices) in &vs.used_attrs {
                println!("  {} {:?}", semantic, indices);
            }
        }
        if let Some(ps) = &capture.fragment_shader {
            println!("\nPixel program {}: {} sampler(s)", ps.version, ps.used_samplers.len());
        }
        println!(
            "\nPositions from: {}",
            match capture.used_attributes(&Semantic::Position).first() {
                Some(attr) => format!("{}{}", attr.semantic, attr.semantic_index),
                None => "first attribute (no live POSITION)".to_string(),
            }
        );
    }
    println!("Has textures: {}", capture.has_textures());

    // Show first few faces
    let shown = capture.faces.len().min(8);
    println!("\nFirst {} face(s):", shown);
    for (i, face) in capture.faces.iter().take(shown).enumerate() {
        println!("  {}: [{}, {}, {}]", i, face[0], face[1], face[2]);
    }

    Ok(())
}
