//! rip-import - batch importer for `.rip` draw call captures
//!
//! Converts every capture given on the command line and prints a summary of
//! the resulting meshes. Settings come from an optional JSON preset, with
//! individual flags taking precedence.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use rayon::prelude::*;
use rip_core::{prepare_import, BatchReport, ImportSettings, MeshCollector, MeshSummary};
use rip_math::Axis;

#[derive(Parser, Debug)]
#[command(name = "rip-import")]
#[command(about = "Import Ninja Ripper .rip captures")]
#[command(version)]
struct Cli {
    /// Capture files to import
    #[arg(required_unless_present = "print_preset")]
    files: Vec<PathBuf>,

    /// JSON preset with import settings
    #[arg(long)]
    preset: Option<PathBuf>,

    /// Print the effective settings as JSON and exit
    #[arg(long)]
    print_preset: bool,

    /// Worker threads for conversion (default: all cores)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Print mesh summaries as JSON
    #[arg(long)]
    json: bool,

    /// Source forward axis (X, Y, Z, -X, -Y, -Z)
    #[arg(long, allow_hyphen_values = true)]
    axis_forward: Option<Axis>,

    /// Source up axis (X, Y, Z, -X, -Y, -Z)
    #[arg(long, allow_hyphen_values = true)]
    axis_up: Option<Axis>,

    /// Mirror the model along X
    #[arg(long)]
    flip_x_axis: bool,

    /// Invert triangle winding
    #[arg(long)]
    flip_winding: bool,

    /// Do not import custom normals
    #[arg(long)]
    no_normals: bool,

    /// Divisor for integer normals
    #[arg(long)]
    normal_int: Option<u32>,

    /// Normal multiplier per axis, e.g. 2,2,2
    #[arg(long, value_parser = parse_floats::<3>, allow_hyphen_values = true)]
    normal_mul: Option<[f32; 3]>,

    /// Normal offset per axis, e.g. -1,-1,-1
    #[arg(long, value_parser = parse_floats::<3>, allow_hyphen_values = true)]
    normal_add: Option<[f32; 3]>,

    /// Divisor for integer UVs
    #[arg(long)]
    uv_int: Option<u32>,

    /// UV multiplier, e.g. 1,1
    #[arg(long, value_parser = parse_floats::<2>, allow_hyphen_values = true)]
    uv_mul: Option<[f32; 2]>,

    /// UV offset, e.g. 0,0
    #[arg(long, value_parser = parse_floats::<2>, allow_hyphen_values = true)]
    uv_add: Option<[f32; 2]>,

    /// Flip V (1 - v)
    #[arg(long)]
    uv_flip_y: bool,

    /// Do not import blend weights
    #[arg(long)]
    no_weights: bool,

    /// Filter attributes using the dumped shader listings
    #[arg(long)]
    use_shaders: bool,

    /// Skip captures without sampled textures
    #[arg(long)]
    skip_untextured: bool,
}

impl Cli {
    /// Layer the command-line flags over `settings`.
    fn apply(&self, mut settings: ImportSettings) -> ImportSettings {
        if let Some(axis) = self.axis_forward {
            settings.axis_forward = axis;
        }
        if let Some(axis) = self.axis_up {
            settings.axis_up = axis;
        }
        settings.flip_x_axis |= self.flip_x_axis;
        settings.flip_winding |= self.flip_winding;
        settings.use_normals &= !self.no_normals;
        settings.use_weights &= !self.no_weights;
        settings.uv_flip_y |= self.uv_flip_y;
        settings.use_shaders |= self.use_shaders;
        settings.skip_untextured |= self.skip_untextured;

        if let Some(v) = self.normal_int {
            settings.normal_int = v;
        }
        if let Some(v) = self.normal_mul {
            settings.normal_mul = v;
        }
        if let Some(v) = self.normal_add {
            settings.normal_add = v;
        }
        if let Some(v) = self.uv_int {
            settings.uv_int = v;
        }
        if let Some(v) = self.uv_mul {
            settings.uv_mul = v;
        }
        if let Some(v) = self.uv_add {
            settings.uv_add = v;
        }

        settings
    }

    fn settings(&self) -> Result<ImportSettings> {
        let base = match &self.preset {
            Some(path) => load_preset(path)?,
            None => ImportSettings::default(),
        };
        Ok(self.apply(base))
    }
}

fn parse_floats<const N: usize>(s: &str) -> Result<[f32; N], String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f32>().map_err(|e| format!("{:?}: {}", v, e)))
        .collect::<Result<Vec<_>, _>>()?;
    <[f32; N]>::try_from(values)
        .map_err(|v| format!("expected {} comma-separated values, got {}", N, v.len()))
}

fn load_preset(path: &Path) -> Result<ImportSettings> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read preset {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid preset {}", path.display()))
}

fn print_summary(summary: &MeshSummary) {
    println!("{}", summary.name);
    println!("  vertices:  {}", summary.vertices);
    println!("  triangles: {}", summary.triangles);
    if summary.normals {
        println!("  normals:   custom");
    }
    if !summary.uv_channels.is_empty() {
        println!("  uv:        {}", summary.uv_channels.join(", "));
    }
    if !summary.color_channels.is_empty() {
        println!("  colors:    {}", summary.color_channels.join(", "));
    }
    if summary.vertex_groups > 0 {
        println!("  groups:    {}", summary.vertex_groups);
    }
    if !summary.textures.is_empty() {
        println!("  textures:  {}", summary.textures.join(", "));
    }
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let settings = cli.settings()?;

    if cli.print_preset {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let options = settings.to_options().context("Invalid axis settings")?;

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = cli.jobs {
        pool = pool.num_threads(jobs);
    }
    let pool = pool.build().context("Failed to start worker threads")?;

    log::info!("Importing {} capture(s)", cli.files.len());
    let prepared: Vec<_> = pool.install(|| {
        cli.files
            .par_iter()
            .map(|path| prepare_import(path, &options))
            .collect()
    });

    let mut report = BatchReport::default();
    let mut meshes = MeshCollector::new();
    for (path, result) in cli.files.iter().zip(prepared) {
        if let Some(import) = report.record(path, result) {
            import.emit(&mut meshes);
        }
    }

    let summaries: Vec<MeshSummary> = meshes.meshes().iter().map(|m| m.summary()).collect();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        summaries.iter().for_each(print_summary);
    }

    log::info!(
        "{} imported, {} skipped, {} failed",
        report.imported.len(),
        report.skipped.len(),
        report.failed.len()
    );

    if !report.is_success() {
        bail!("{} of {} capture(s) failed", report.failed.len(), report.total());
    }
    Ok(())
}
