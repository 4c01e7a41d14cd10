//! Meshkiln command line interface
//!
//! Converts scene files into engine-ready artifacts and inspects
//! artifacts that were written earlier.

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use meshkiln::driver::{self, ExportConfig};
use meshkiln_core::ArtifactKind;
use meshkiln_export::reader;
use meshkiln_scene::GltfSource;

#[derive(Parser)]
#[command(name = "meshkiln")]
#[command(author, version, about = "Converts 3D scenes into engine-ready mesh, skin and animation artifacts", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format: text or json
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert scene files into engine artifacts
    Convert(ConvertArgs),
    /// Summarize a previously written artifact
    Inspect(InspectArgs),
}

#[derive(Args)]
struct ConvertArgs {
    /// Scene files or directories to scan
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory artifacts are written to (default: next to each input)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Artifact kind to produce: auto, mesh, skin or anim
    #[arg(short, long, default_value = "auto")]
    kind: KindArg,

    /// Accept only these extensions when scanning directories
    #[arg(long = "extension")]
    extensions: Vec<String>,
}

#[derive(Args)]
struct InspectArgs {
    /// Artifact file to inspect
    artifact: PathBuf,

    /// Artifact kind when the file extension is ambiguous
    #[arg(short, long)]
    kind: Option<KindArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KindArg {
    Auto,
    Mesh,
    Skin,
    Anim,
}

impl FromStr for KindArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(KindArg::Auto),
            "mesh" | "static" => Ok(KindArg::Mesh),
            "skin" | "rigged" => Ok(KindArg::Skin),
            "anim" | "animation" => Ok(KindArg::Anim),
            _ => Err(format!("Unknown artifact kind: {s}")),
        }
    }
}

impl KindArg {
    /// Kind this argument forces; `Auto` leaves classification to the scene
    fn force(self) -> Option<ArtifactKind> {
        match self {
            KindArg::Auto => None,
            KindArg::Mesh => Some(ArtifactKind::StaticMesh),
            KindArg::Skin => Some(ArtifactKind::RiggedMesh),
            KindArg::Anim => Some(ArtifactKind::AnimationClip),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Convert(args) => cmd_convert(args),
        Commands::Inspect(args) => cmd_inspect(args, cli.format),
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_thread_ids(verbosity >= 3)
        .with_file(verbosity >= 3)
        .with_line_number(verbosity >= 3)
        .init();
}

fn cmd_convert(args: ConvertArgs) -> Result<()> {
    let config = ExportConfig {
        out_dir: args.out_dir,
        kind: args.kind.force(),
        extensions: args.extensions,
    };
    let source = GltfSource;
    let summary = driver::run(&config, &source, &args.inputs)?;

    println!("Conversion complete:");
    println!("  Converted: {}", summary.converted);
    println!("  Failed:    {}", summary.failed);
    println!("  Skipped:   {}", summary.skipped);
    if !summary.stats.is_clean() {
        println!(
            "  Dropped:   {} influences, {} channels",
            summary.stats.dropped_influences, summary.stats.dropped_channels
        );
    }

    if summary.failed > 0 {
        bail!(
            "{} of {} conversions failed",
            summary.failed,
            summary.converted + summary.failed
        );
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs, format: OutputFormat) -> Result<()> {
    let kind = match args.kind.and_then(KindArg::force) {
        Some(kind) => kind,
        None => kind_from_path(&args.artifact)?,
    };

    let size = fs::metadata(&args.artifact)
        .with_context(|| format!("reading {}", args.artifact.display()))?
        .len();
    let file = fs::File::open(&args.artifact)
        .with_context(|| format!("opening {}", args.artifact.display()))?;
    let mut stream = BufReader::new(file);

    match kind {
        ArtifactKind::StaticMesh => inspect_static(&args.artifact, size, format, &mut stream),
        ArtifactKind::RiggedMesh => inspect_rigged(&args.artifact, size, format, &mut stream),
        ArtifactKind::AnimationClip => {
            inspect_animation(&args.artifact, size, format, &mut stream)
        }
    }
}

/// Infer the artifact kind from the file extension
fn kind_from_path(path: &Path) -> Result<ArtifactKind> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ArtifactKind::from_extension(extension) {
        Some(kind) => Ok(kind),
        None => bail!(
            "cannot infer artifact kind of {}; pass --kind",
            path.display()
        ),
    }
}

fn inspect_static(
    path: &Path,
    size: u64,
    format: OutputFormat,
    stream: &mut impl std::io::Read,
) -> Result<()> {
    let artifact = reader::read_static(stream)?;

    match format {
        OutputFormat::Json => {
            let info = serde_json::json!({
                "file": path.display().to_string(),
                "kind": "static-mesh",
                "size": size,
                "vertices": artifact.vertices.len(),
                "indices": artifact.indices.len(),
                "submeshes": artifact
                    .submeshes
                    .iter()
                    .map(|submesh| {
                        serde_json::json!({
                            "name": submesh.name,
                            "index_count": submesh.index_count,
                            "start_index": submesh.start_index,
                            "base_vertex": submesh.base_vertex,
                            "diffuse_texture": submesh.diffuse_texture,
                            "normal_texture": submesh.normal_texture,
                        })
                    })
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        OutputFormat::Text => {
            println!("Static mesh: {} ({})", path.display(), format_size(size));
            println!("  Submeshes: {}", artifact.submeshes.len());
            println!("  Vertices:  {}", artifact.vertices.len());
            println!("  Indices:   {}", artifact.indices.len());
            for (i, submesh) in artifact.submeshes.iter().enumerate() {
                println!(
                    "    {}. {} ({} indices, diffuse: {})",
                    i + 1,
                    submesh.name,
                    submesh.index_count,
                    or_none(&submesh.diffuse_texture),
                );
            }
        }
    }
    Ok(())
}

fn inspect_rigged(
    path: &Path,
    size: u64,
    format: OutputFormat,
    stream: &mut impl std::io::Read,
) -> Result<()> {
    let artifact = reader::read_rigged(stream)?;

    match format {
        OutputFormat::Json => {
            let info = serde_json::json!({
                "file": path.display().to_string(),
                "kind": "rigged-mesh",
                "size": size,
                "bones": artifact.bones.len(),
                "vertices": artifact.vertices.len(),
                "indices": artifact.indices.len(),
                "submeshes": artifact
                    .submeshes
                    .iter()
                    .map(|submesh| {
                        serde_json::json!({
                            "name": submesh.name,
                            "index_count": submesh.index_count,
                            "node_id": submesh.node_id,
                            "bones": submesh.bone_names.len(),
                        })
                    })
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        OutputFormat::Text => {
            println!("Rigged mesh: {} ({})", path.display(), format_size(size));
            println!("  Bones:     {}", artifact.bones.len());
            println!("  Submeshes: {}", artifact.submeshes.len());
            println!("  Vertices:  {}", artifact.vertices.len());
            println!("  Indices:   {}", artifact.indices.len());
            for (i, submesh) in artifact.submeshes.iter().enumerate() {
                println!(
                    "    {}. {} ({} indices, node {}, {} bones)",
                    i + 1,
                    submesh.name,
                    submesh.index_count,
                    submesh.node_id,
                    submesh.bone_names.len(),
                );
            }
        }
    }
    Ok(())
}

fn inspect_animation(
    path: &Path,
    size: u64,
    format: OutputFormat,
    stream: &mut impl std::io::Read,
) -> Result<()> {
    let artifact = reader::read_animation(stream)?;

    match format {
        OutputFormat::Json => {
            let info = serde_json::json!({
                "file": path.display().to_string(),
                "kind": "animation-clip",
                "size": size,
                "bones": artifact.bones.len(),
                "animations": artifact
                    .animations
                    .iter()
                    .map(|clip| {
                        serde_json::json!({
                            "name": clip.name,
                            "ticks_per_second": clip.ticks_per_second,
                            "duration": clip.duration,
                            "channels": clip.channels.len(),
                            "keyed": clip.channels.iter().filter(|c| c.has_keys()).count(),
                        })
                    })
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        OutputFormat::Text => {
            println!(
                "Animation clip: {} ({})",
                path.display(),
                format_size(size)
            );
            println!("  Bones:      {}", artifact.bones.len());
            println!("  Animations: {}", artifact.animations.len());
            for (i, clip) in artifact.animations.iter().enumerate() {
                let keyed = clip.channels.iter().filter(|c| c.has_keys()).count();
                println!(
                    "    {}. {} ({} tps, {} ticks, {} channels, {} keyed)",
                    i + 1,
                    clip.name,
                    clip.ticks_per_second,
                    clip.duration,
                    clip.channels.len(),
                    keyed,
                );
            }
        }
    }
    Ok(())
}

/// Placeholder for empty texture paths in text output
fn or_none(path: &str) -> &str {
    if path.is_empty() {
        "none"
    } else {
        path
    }
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
