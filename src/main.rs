//! Dungeon Assembler - command line entry point
//!
//! Grows a layout from a seed piece and prints it as JSON or a short text
//! report. Runs against the built-in demo pieces unless a catalog
//! directory is given.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use dungeon_assembler::catalog::builtin::demo_catalog;
use dungeon_assembler::catalog::{analyze_template, PieceCatalog};
use dungeon_assembler::core::error::{DungeonError, Result};
use dungeon_assembler::core::types::TemplateId;
use dungeon_assembler::core::GeneratorConfig;
use dungeon_assembler::layout::{expand_seed, Expansion, GrowthEngine, LayoutResult};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dungeon-assembler")]
#[command(about = "Assemble dungeon layouts from modular pieces")]
struct Args {
    /// Directory of piece templates (TOML); the demo pieces are used if omitted
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Generator settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Grow a sealed layout from a seed piece
    Generate {
        /// Name of the seed template
        #[arg(long, default_value = "corridor_straight")]
        start: String,

        /// Random seed for deterministic runs
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        max_pieces: Option<usize>,

        #[arg(long)]
        max_attempts: Option<usize>,
    },
    /// Attach one room to every connector of a seed piece
    Expand {
        #[arg(long, default_value = "corridor_straight")]
        start: String,

        #[arg(long)]
        seed: Option<u64>,
    },
    /// Report floor, doorway walls and blind walls of every template
    Analyze,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Text,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dungeon_assembler=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let catalog = match &args.catalog {
        Some(dir) => {
            let mut catalog = PieceCatalog::new();
            catalog.load_directory(dir)?;
            tracing::info!("Loaded {} templates from {}", catalog.len(), dir.display());
            catalog
        }
        None => demo_catalog(),
    };
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };

    match args.command {
        Command::Generate {
            start,
            seed,
            max_pieces,
            max_attempts,
        } => {
            if let Some(n) = max_pieces {
                config.max_pieces = n;
            }
            if let Some(n) = max_attempts {
                config.max_attempts = n;
            }
            let seed_value = seed.or(config.seed).unwrap_or_else(|| rand::random());
            let start_id = resolve(&catalog, &start)?;

            let rng = ChaCha8Rng::seed_from_u64(seed_value);
            let layout = GrowthEngine::new(&catalog, config, rng)?.generate(start_id)?;
            match args.format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&layout)?),
                Format::Text => print_layout(&layout, seed_value),
            }
        }
        Command::Expand { start, seed } => {
            let seed_value = seed.or(config.seed).unwrap_or_else(|| rand::random());
            let start_id = resolve(&catalog, &start)?;

            let mut rng = ChaCha8Rng::seed_from_u64(seed_value);
            let expansion = expand_seed(&catalog, start_id, &config, &mut rng)?;
            match args.format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&expansion)?),
                Format::Text => print_expansion(&expansion),
            }
        }
        Command::Analyze => {
            let reports: Vec<_> = catalog
                .iter()
                .map(|(_, t)| (t.name().to_string(), analyze_template(t)))
                .collect();
            match args.format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
                Format::Text => {
                    for (name, report) in &reports {
                        println!(
                            "{:<20} floor={:<8} doorways={:?} blind={:?}",
                            name,
                            report.floor.as_deref().unwrap_or("-"),
                            report.doorway_walls,
                            report.blind_walls
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

fn resolve(catalog: &PieceCatalog, name: &str) -> Result<TemplateId> {
    catalog
        .id_by_name(name)
        .ok_or_else(|| DungeonError::TemplateNotFound(name.to_string()))
}

fn print_layout(layout: &LayoutResult, seed: u64) {
    println!("=== LAYOUT (seed {}) ===", seed);
    for piece in layout.layout_pieces() {
        let p = piece.pose.position;
        println!(
            "  {:<10} {:<20} at ({:>7.2}, {:>7.2}, {:>7.2}) yaw {:>6.1}",
            piece.label,
            piece.template_name,
            p.x,
            p.y,
            p.z,
            piece.pose.yaw().to_degrees()
        );
    }
    println!();
    println!("Pieces placed:  {}", layout.placed_count);
    println!("Closing walls:  {}", layout.seal_count());
    println!("Rejections:     {}", layout.rejections);
    println!("Iterations:     {}", layout.iterations);
    println!("Stopped:        {}", layout.stop_reason);
    if !layout.unresolved.is_empty() {
        println!("Left open:      {}", layout.unresolved.len());
    }
}

fn print_expansion(expansion: &Expansion) {
    println!("=== EXPANSION of {} ===", expansion.seed.template_name);
    for (room, link) in expansion.rooms.iter().zip(&expansion.links) {
        let p = room.pose.position;
        println!(
            "  {} -> {:<20} at ({:>7.2}, {:>7.2}, {:>7.2})",
            link.target, room.template_name, p.x, p.y, p.z
        );
    }
    if !expansion.skipped.is_empty() {
        println!("Skipped connectors: {}", expansion.skipped.len());
    }
}
