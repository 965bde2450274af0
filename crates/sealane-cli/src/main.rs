use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sealane_lib::{
    load_seaports, BuildSummary, BuilderConfig, PortRole, PortSnapper, SeaLaneGraph,
    SeaLaneGraphBuilder, DEFAULT_GRID_STEP_DEGREES,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Sea-lane graph utilities")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the global sea-lane graph from a land mask.
    Build {
        /// Output directory for the graph and its sidecars.
        #[arg(long)]
        output: PathBuf,
        /// GeoJSON land polygon dataset (EPSG:4326).
        #[arg(long)]
        landmask: PathBuf,
        /// Primary grid step in degrees.
        #[arg(long, default_value_t = DEFAULT_GRID_STEP_DEGREES)]
        step: f64,
        /// Warn instead of failing when connectivity invariants are violated.
        #[arg(long)]
        no_strict_connectivity: bool,
    },
    /// Load UN/LOCODE tables and report the seaport count.
    Ports {
        /// UN/LOCODE CSV files (CodeListPart1, Part2, Part3).
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Snap a coordinate to its nearest seaport.
    Snap {
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lon: f64,
        /// UN/LOCODE CSV files to load ports from.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the build summary of a persisted sea graph.
    Summary {
        /// Graph output directory.
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            output,
            landmask,
            step,
            no_strict_connectivity,
        } => handle_build(&output, &landmask, step, !no_strict_connectivity),
        Command::Ports { files } => handle_ports(&files),
        Command::Snap { lat, lon, files } => handle_snap(lat, lon, &files),
        Command::Summary { dir } => handle_summary(&dir),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_build(output: &Path, landmask: &Path, step: f64, strict: bool) -> Result<()> {
    let config = BuilderConfig {
        grid_step_degrees: step,
        strict_connectivity: strict,
    };
    let builder = SeaLaneGraphBuilder::new(output, landmask, config)
        .context("invalid builder configuration")?;
    let summary = builder.build().context("sea-lane graph build failed")?;

    println!("Build completed successfully");
    println!("  Version:    {}", summary.sea_graph_version);
    println!("  Nodes:      {}", summary.node_count);
    println!("  Edges:      {}", summary.edge_count);
    println!("  Components: {}", summary.connected_component_count);
    println!("  Duration:   {} ms", summary.build_duration_ms);
    Ok(())
}

fn handle_ports(files: &[PathBuf]) -> Result<()> {
    let ports = load_seaports(files);
    println!("Loaded {} seaports", ports.len());
    for port in ports.iter().take(10) {
        println!("- {} {} ({:.4}, {:.4})", port.unlocode, port.name, port.lat, port.lon);
    }
    if ports.len() > 10 {
        println!("... and {} more", ports.len() - 10);
    }
    Ok(())
}

fn handle_snap(lat: f64, lon: f64, files: &[PathBuf]) -> Result<()> {
    let ports = load_seaports(files);
    let snapper = PortSnapper::new(ports);
    let result = snapper
        .snap(lat, lon, PortRole::PortOfLoading)
        .context("port snap failed")?;

    println!(
        "Snapped ({lat:.4}, {lon:.4}) to {} {} at ({:.4}, {:.4}), {:.1} km away",
        result.unlocode, result.name, result.lat, result.lon, result.snap_distance_km
    );
    Ok(())
}

fn handle_summary(dir: &Path) -> Result<()> {
    let path = SeaLaneGraph::build_summary_path(dir);
    let summary = BuildSummary::load(&path)
        .with_context(|| format!("failed to read build summary from {}", path.display()))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
