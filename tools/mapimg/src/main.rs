//! Overview map tool: runs the generation pipeline and writes a one-pixel-
//! per-cell PNG (and optionally a JSON walkability export) of the result.
//! Consumes only the read-only grid accessors; no simulation happens here.

use anyhow::{Context, Result};
use clap::Parser;
use rand::Rng;
use serde::Serialize;
use tracing::info;

use overland_core::world::feature;
use overland_core::{
    Biome, Compass, MoistureModel, World, WorldConfig, WorldGenerator,
};

#[derive(Parser, Debug)]
#[command(name = "mapimg", about = "Generate an overworld and write an overview map")]
struct Args {
    /// Map width in cells.
    #[arg(long, default_value_t = 512)]
    width: usize,

    /// Map height in cells.
    #[arg(long, default_value_t = 512)]
    height: usize,

    /// Worker bands for the parallel phases.
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Height noise frequency.
    #[arg(long, default_value_t = 5.0)]
    h_freq: f64,

    /// Moisture noise frequency.
    #[arg(long, default_value_t = 2.0)]
    m_freq: f64,

    /// Soil depth noise frequency.
    #[arg(long, default_value_t = 20.0)]
    s_freq: f64,

    /// Tree/rock/plant density noise frequency.
    #[arg(long, default_value_t = 200.0)]
    d_freq: f64,

    /// Base seed; field seeds derive from it. Random when omitted.
    #[arg(long)]
    seed: Option<u32>,

    /// Advect moisture with clouds from this wind direction instead of noise
    /// (north, east, south, west).
    #[arg(long)]
    wind: Option<String>,

    /// Output PNG path.
    #[arg(long, default_value = "overworld.png")]
    out: String,

    /// Also write a JSON walkability export to this path.
    #[arg(long)]
    json: Option<String>,
}

/// Biome palette, one colour per enum value.
fn biome_color(biome: Biome) -> [u8; 3] {
    match biome {
        Biome::Ocean => [51, 166, 204],
        Biome::River => [0, 102, 102],
        Biome::Beach => [255, 230, 128],
        Biome::DryRock => [204, 204, 204],
        Biome::MoistRock => [166, 166, 166],
        Biome::Heathland => [202, 218, 114],
        Biome::Shrubland => [128, 153, 51],
        Biome::Grassland => [170, 190, 50],
        Biome::Moorland => [217, 179, 255],
        Biome::Fenland => [85, 128, 0],
        Biome::Woodland => [119, 179, 0],
        Biome::Forest => [77, 153, 0],
    }
}

fn parse_wind(name: &str) -> Result<Compass> {
    match name.to_lowercase().as_str() {
        "north" => Ok(Compass::North),
        "east" => Ok(Compass::East),
        "south" => Ok(Compass::South),
        "west" => Ok(Compass::West),
        other => anyhow::bail!("unrecognised wind direction: {other}"),
    }
}

// ── JSON export ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ExportCell {
    x: usize,
    y: usize,
    blocked: bool,
}

#[derive(Serialize)]
struct ExportWorld {
    width: usize,
    height: usize,
    cells: Vec<ExportCell>,
}

fn export_json(world: &World, path: &str) -> Result<()> {
    let mut cells = Vec::with_capacity(world.width() * world.height());
    for y in 0..world.height() {
        for x in 0..world.width() {
            let blocked = world.is_river(x, y)
                || world.is_wall(x, y)
                || world.biome_at(x, y) == Biome::Ocean
                || world.has_feature(x, y, feature::TREE)
                || world.has_feature(x, y, feature::ROCK);
            cells.push(ExportCell { x, y, blocked });
        }
    }
    let export = ExportWorld {
        width: world.width(),
        height: world.height(),
        cells,
    };
    let file = std::fs::File::create(path).with_context(|| format!("cannot create {path}"))?;
    serde_json::to_writer(file, &export).context("JSON export failed")?;
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let base_seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!(base_seed, "field seeds derive from base seed");

    let mut config = WorldConfig {
        width: args.width,
        height: args.height,
        workers: args.workers,
        ..WorldConfig::default()
    };
    config.seeds.height = base_seed;
    config.seeds.moisture = base_seed.wrapping_add(1);
    config.seeds.soil = base_seed.wrapping_add(2);
    config.seeds.tree = base_seed.wrapping_add(3);
    config.seeds.rock = base_seed.wrapping_add(4);
    config.seeds.plant = base_seed.wrapping_add(5);
    config.frequencies.height = args.h_freq;
    config.frequencies.moisture = args.m_freq;
    config.frequencies.soil = args.s_freq;
    config.frequencies.density = args.d_freq;
    if let Some(wind) = &args.wind {
        config.moisture_model = MoistureModel::Clouds {
            wind: parse_wind(wind)?,
            initial: 6.0,
        };
    }

    let generator = WorldGenerator::new(config).context("invalid configuration")?;
    let world = generator.generate();

    // One pixel per cell; placed features tint over the biome colour.
    let mut img = image::RgbImage::new(world.width() as u32, world.height() as u32);
    for y in 0..world.height() {
        for x in 0..world.width() {
            let px = if world.has_feature(x, y, feature::TREE) {
                [38, 77, 0]
            } else if world.has_feature(x, y, feature::ROCK) {
                [220, 220, 220]
            } else {
                biome_color(world.biome_at(x, y))
            };
            img.put_pixel(x as u32, y as u32, image::Rgb(px));
        }
    }
    img.save(&args.out)
        .with_context(|| format!("failed to save {}", args.out))?;
    info!(path = %args.out, "overview map written");

    if let Some(json_path) = &args.json {
        export_json(&world, json_path)?;
        info!(path = %json_path, "JSON export written");
    }

    Ok(())
}
