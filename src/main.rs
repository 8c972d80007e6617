//! biomegen CLI - procedural biome map and chunk generator.
//!
//! Composes a coarse biome map from Poisson-disk seeded Voronoi passes and
//! writes it, together with any selected detailed chunks, as PNG images.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use biomegen::biomes::{expected_pass_count, spacing_for_depth};
use biomegen::config::GeneratorConfig;
use biomegen::export::{export_biome_map_png, ChunkImageMode, PngChunkSink, PngExportOptions, BIOME_MAP_FILE};
use biomegen::logging::init_logging;
use biomegen::pipeline::{
    ChunkSelection, ChunkStage, CompositionStage, Pipeline, ProgressFn, StageConfig, World,
};
use biomegen::random::entropy_seed;
use biomegen::terrain::{Cell, ChunkConfig};
use biomegen::{Biome, CompositionConfig, OverrideRules};

/// Procedural biome map generator.
#[derive(Parser)]
#[command(name = "biomegen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a biome map and, optionally, detailed chunks.
    Generate(GenerateArgs),

    /// Display information about a map configuration.
    Info {
        /// Continent radius in coarse cells.
        #[arg(short, long, default_value = "64")]
        depth: u32,

        /// Chunk width and height in pixels.
        #[arg(long, default_value = "256")]
        chunk_size: u32,

        /// Smallest refinement depth.
        #[arg(long, default_value = "4")]
        min_depth: u32,

        /// Refinement preset.
        #[arg(long, default_value = "fine")]
        variant: Variant,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Continent radius in coarse cells; the map is 2*depth+1 wide.
    #[arg(short, long)]
    depth: Option<u32>,

    /// Random seed for reproducible generation.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Output directory for generated files.
    #[arg(short, long, default_value = "./output")]
    output: PathBuf,

    /// Refinement preset [default: fine].
    #[arg(long)]
    variant: Option<Variant>,

    /// Smallest refinement depth.
    #[arg(long)]
    min_depth: Option<u32>,

    /// Candidate attempts per active sample.
    #[arg(long)]
    attempts: Option<usize>,

    /// Badlands ring radius as a multiple of depth.
    #[arg(long)]
    ring_scale: Option<f32>,

    /// Probability of each override rule (ruins, mountain, river).
    #[arg(long)]
    probability: Option<f64>,

    /// Chunk width and height in pixels.
    #[arg(long)]
    chunk_size: Option<u32>,

    /// Number of detail noise octaves.
    #[arg(long)]
    octaves: Option<u8>,

    /// Amplitude decay per detail octave.
    #[arg(long)]
    persistence: Option<f32>,

    /// Coarse cells to write as chunks: x,y,width,height.
    #[arg(long, value_parser = parse_region, conflicts_with = "all_chunks")]
    chunk_region: Option<ChunkSelection>,

    /// Write a chunk for every coarse cell.
    #[arg(long)]
    all_chunks: bool,

    /// How chunk images are drawn.
    #[arg(long, default_value = "shaded")]
    chunk_image: ChunkImage,

    /// Load settings from a JSON file; flags given on the command line win.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective settings to a JSON file.
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Log debug output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Variant {
    /// Refine down to the minimum depth with sparse overrides.
    Fine,
    /// One refinement pass with denser overrides.
    Coarse,
}

#[derive(Clone, Copy, ValueEnum)]
enum ChunkImage {
    /// Flat biome colors.
    Biome,
    /// 16-bit grayscale detail values.
    Detail,
    /// Biome colors shaded by detail.
    Shaded,
}

impl From<ChunkImage> for ChunkImageMode {
    fn from(image: ChunkImage) -> Self {
        match image {
            ChunkImage::Biome => ChunkImageMode::Biome,
            ChunkImage::Detail => ChunkImageMode::Detail,
            ChunkImage::Shaded => ChunkImageMode::Shaded,
        }
    }
}

fn parse_region(s: &str) -> Result<ChunkSelection, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!("expected x,y,width,height, got '{s}'"));
    }
    let mut values = [0u32; 4];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part
            .parse()
            .map_err(|e| format!("invalid number '{part}': {e}"))?;
    }
    Ok(ChunkSelection::Region {
        x: values[0],
        y: values[1],
        width: values[2],
        height: values[3],
    })
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => {
            init_logging(args.verbose);
            run_generate(args);
        }
        Commands::Info {
            depth,
            chunk_size,
            min_depth,
            variant,
        } => {
            run_info(depth, chunk_size, min_depth, variant);
        }
    }
}

fn composition_preset(variant: Variant, depth: u32) -> CompositionConfig {
    match variant {
        Variant::Fine => CompositionConfig::fine(depth),
        Variant::Coarse => CompositionConfig::coarse(depth),
    }
}

/// Prints "NN% complete" on one line whenever the percentage grows.
fn progress_line() -> ProgressFn {
    let shown = AtomicU32::new(0);
    Arc::new(move |fraction: f32| {
        let percent = (fraction.clamp(0.0, 1.0) * 100.0) as u32;
        if shown.fetch_max(percent, Ordering::Relaxed) < percent {
            print!("\r  {:>3}% complete", percent);
            let _ = std::io::stdout().flush();
        }
    })
}

fn build_config(args: &GenerateArgs) -> GeneratorConfig {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path).unwrap_or_else(|e| {
            eprintln!("Error: Cannot load {}: {}", path.display(), e);
            std::process::exit(1);
        }),
        None => GeneratorConfig {
            composition: composition_preset(
                args.variant.unwrap_or(Variant::Fine),
                args.depth.unwrap_or(64),
            ),
            ..Default::default()
        },
    };

    if let Some(depth) = args.depth {
        config.composition.depth = depth;
    }
    if let (Some(_), Some(variant)) = (&args.config, args.variant) {
        let preset = composition_preset(variant, config.composition.depth);
        config.composition.max_refinements = preset.max_refinements;
        config.composition.overrides = preset.overrides;
    }
    if let Some(min_depth) = args.min_depth {
        config.composition.min_depth = min_depth;
    }
    if let Some(attempts) = args.attempts {
        config.composition.attempts = attempts;
    }
    if let Some(ring_scale) = args.ring_scale {
        config.composition.ring_scale = ring_scale;
    }
    if let Some(p) = args.probability {
        let rules = &config.composition.overrides;
        config.composition.overrides = OverrideRules {
            protected: rules.protected.clone(),
            river_protected: rules.river_protected.clone(),
            ..OverrideRules::with_probability(p)
        };
    }
    if let Some(size) = args.chunk_size {
        config.chunks.size = size;
    }
    if let Some(octaves) = args.octaves {
        config.detail.octaves = octaves;
    }
    if let Some(persistence) = args.persistence {
        config.detail.persistence = persistence;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config
}

fn run_generate(args: GenerateArgs) {
    let mut config = build_config(&args);

    // Validate parameters
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let seed = config.seed.unwrap_or_else(entropy_seed);
    config.seed = Some(seed);

    if let Some(path) = &args.save_config {
        if let Err(e) = config.save(path) {
            eprintln!("Error: Cannot save config to {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }

    let selection = if args.all_chunks {
        Some(ChunkSelection::All)
    } else {
        args.chunk_region
    };

    let output = args.output;
    let side = config.composition.domain_size();
    println!("biomegen - Procedural Biome Map Generator");
    println!("=========================================");
    println!("Depth: {} ({}x{} coarse cells)", config.composition.depth, side, side);
    println!("Seed: {}", seed);
    println!("Output: {}", output.display());

    if let Err(e) = std::fs::create_dir_all(&output) {
        eprintln!("Error: Cannot create output directory: {}", e);
        std::process::exit(1);
    }

    let start = Instant::now();

    let mut pipeline = Pipeline::new(StageConfig::with_seed(seed));
    pipeline.add_stage(CompositionStage::new(config.composition.clone()).with_progress(progress_line()));

    if let Some(selection) = selection {
        let sink = PngChunkSink::new(&output, args.chunk_image.into(), PngExportOptions::fast())
            .unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });
        pipeline.add_stage(
            ChunkStage::new(config.chunks.clone(), config.detail.clone(), selection, Arc::new(sink))
                .with_progress(progress_line()),
        );
        println!(
            "Chunks: {}x{} pixels, {} octaves",
            config.chunks.size, config.chunks.size, config.detail.octaves
        );
    } else {
        println!("Chunks: SKIPPED (use --chunk-region or --all-chunks)");
    }

    let mut world = World::default();
    pipeline
        .run_with_callbacks(
            &mut world,
            |name, i, total| {
                println!("\n[{}/{}] {}...", i + 1, total, name);
            },
            |name, _, _| {
                println!("\r  {} complete", name);
            },
        )
        .unwrap_or_else(|e| {
            eprintln!("\nError: {}", e);
            std::process::exit(1);
        });

    let gen_time = start.elapsed();
    println!("\nGeneration completed in {:.2?}", gen_time);

    println!("\nPasses:");
    for pass in &world.passes {
        println!(
            "  #{:<2} depth {:>4}  spacing {:>5}  samples {:>7}  overrides {:>5}  degenerate {}",
            pass.index,
            pass.depth,
            pass.spacing,
            pass.samples,
            pass.overrides.total(),
            pass.tessellation.degenerate
        );
    }
    if world.chunks_written > 0 {
        println!("Chunks written: {}", world.chunks_written);
    }

    let Some(map) = world.biome_map.as_ref() else {
        eprintln!("Error: No biome map was produced");
        std::process::exit(1);
    };

    let export_start = Instant::now();
    let map_path = output.join(BIOME_MAP_FILE);
    if let Err(e) = export_biome_map_png(map, &map_path, &PngExportOptions::default()) {
        eprintln!("Error exporting biome map: {}", e);
        std::process::exit(1);
    }
    println!("\nExported {}", map_path.display());

    let counts = map.biome_histogram();
    let mut hist: Vec<(Biome, usize)> = Biome::ALL
        .iter()
        .map(|b| (*b, counts[b.as_u8() as usize]))
        .collect();
    hist.sort_by(|a, b| b.1.cmp(&a.1));
    println!("\nBiome coverage:");
    let total = map.pixel_count() as f64;
    for (biome, count) in hist {
        println!("  {:<9} {:>6.2}%", biome.name(), 100.0 * count as f64 / total);
    }

    println!("\nExport completed in {:.2?}", export_start.elapsed());
    println!("Total time: {:.2?}", start.elapsed());
    println!("Done!");
}

fn run_info(depth: u32, chunk_size: u32, min_depth: u32, variant: Variant) {
    let mut config = match variant {
        Variant::Fine => GeneratorConfig::fine(depth),
        Variant::Coarse => GeneratorConfig::coarse(depth),
    };
    config.composition.min_depth = min_depth;
    config.chunks = ChunkConfig {
        size: chunk_size,
        ..Default::default()
    };
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let side = config.composition.domain_size() as u64;
    let coarse_cells = side * side;
    let passes = expected_pass_count(depth, min_depth, config.composition.max_refinements);
    let chunk_pixels = (chunk_size as u64) * (chunk_size as u64);
    let total_pixels = coarse_cells * chunk_pixels;

    let bytes_map = coarse_cells * std::mem::size_of::<Cell>() as u64;
    let bytes_chunk = config.chunks.chunk_bytes() as u64;
    let bytes_chunk_png = chunk_pixels * 3;

    println!("biomegen - Map Configuration Info");
    println!("=================================");
    println!();
    println!("Depth: {} ({}x{} coarse cells)", depth, side, side);
    println!("Passes: {}", passes);
    let mut d = depth;
    for i in 0..passes {
        println!("  #{:<2} depth {:>5}  spacing {:>5}", i, d, spacing_for_depth(d));
        d >>= 1;
    }
    println!();
    println!("Chunks: {} of {}x{} pixels", coarse_cells, chunk_size, chunk_size);
    println!("  Full-resolution pixels: {:>16}", total_pixels);
    println!();
    println!("Memory usage (in-memory):");
    println!("  Coarse map:  {:>12} bytes ({:.2} MB)", bytes_map, bytes_map as f64 / 1024.0 / 1024.0);
    println!("  Per chunk:   {:>12} bytes ({:.2} MB)", bytes_chunk, bytes_chunk as f64 / 1024.0 / 1024.0);
    println!();
    println!("Export file sizes (uncompressed upper bound):");
    println!("  Biome map:   {:>12} bytes", coarse_cells * 3);
    println!("  Per chunk:   {:>12} bytes", bytes_chunk_png);
    let all = bytes_chunk_png * coarse_cells;
    println!("  All chunks:  {:>12} bytes ({:.2} GB)", all, all as f64 / 1024.0 / 1024.0 / 1024.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_args(extra: &[&str]) -> GenerateArgs {
        let mut argv = vec!["biomegen", "generate"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Generate(args) => args,
            Commands::Info { .. } => unreachable!(),
        }
    }

    #[test]
    fn test_variant_flag_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fine.json");
        GeneratorConfig::fine(32).save(&path).unwrap();
        let path = path.to_str().unwrap();

        let kept = build_config(&generate_args(&["--config", path]));
        assert_eq!(kept.composition, CompositionConfig::fine(32));

        let coarse = build_config(&generate_args(&["--config", path, "--variant", "coarse"]));
        assert_eq!(coarse.composition, CompositionConfig::coarse(32));

        // Later flags still refine the preset.
        let tuned = build_config(&generate_args(&[
            "--config", path, "--variant", "coarse", "--depth", "16", "--probability", "0.5",
        ]));
        assert_eq!(tuned.composition.depth, 16);
        assert_eq!(tuned.composition.max_refinements, Some(1));
        assert_eq!(tuned.composition.overrides, OverrideRules::with_probability(0.5));
    }

    #[test]
    fn test_variant_defaults_to_fine() {
        let config = build_config(&generate_args(&["--depth", "24"]));
        assert_eq!(config.composition, CompositionConfig::fine(24));
    }

    #[test]
    fn test_parse_region() {
        assert_eq!(
            parse_region("1, 2,3,4"),
            Ok(ChunkSelection::Region { x: 1, y: 2, width: 3, height: 4 })
        );
        assert!(parse_region("1,2,3").is_err());
        assert!(parse_region("a,2,3,4").is_err());
    }
}
