//! `cellmap` — build, persist and query a cell-indexed road map.
//!
//! Ingests an OSM extract (Overpass JSON, or `.pbf` with the `pbf` feature)
//! into a fixed-level cell grid, saves it as a snapshot, and answers
//! spatial and attribute queries against saved snapshots.
//!
//! Run with:
//!   cargo run -p cellmap-cli -- ingest demos/cellmap-cli/data/sample_overpass.json sample.cms
//!   cargo run -p cellmap-cli -- query-point sample.cms 37.7749 -122.4194
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `info`).

mod commands;
#[cfg(test)]
mod tests;

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};

use cm_core::{BoundingBox, DEFAULT_LEVEL, MapConfig};

/// Cell-indexed road map builder and query tool
#[derive(Parser)]
#[command(name = "cellmap", version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Cell level roads are indexed at
    #[arg(long, global = true, default_value_t = DEFAULT_LEVEL)]
    level: u8,

    /// Directory relative snapshot paths are resolved against
    #[arg(long, global = true, default_value = "./map_data")]
    storage_dir: PathBuf,

    /// Skip the `<name>_summary.json` file written next to snapshots
    #[arg(long, global = true)]
    no_summary: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest an OSM extract and save it as a snapshot
    Ingest {
        /// Overpass JSON export (or `.pbf` with the `pbf` feature)
        input: PathBuf,
        /// Snapshot to write
        snapshot: PathBuf,
        /// Only ingest inside `min_lat,min_lng,max_lat,max_lng`
        #[arg(long, value_parser = parse_bbox, conflicts_with = "around", allow_hyphen_values = true)]
        bbox: Option<BoundingBox>,
        /// Only ingest within `lat,lng,radius_m`
        #[arg(long, value_parser = parse_around, allow_hyphen_values = true)]
        around: Option<(f64, f64, f64)>,
        /// Comma-separated `highway` classes to keep
        #[arg(long, value_delimiter = ',')]
        road_types: Vec<String>,
        /// Give up after this many seconds, keeping what was committed
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Roads in the cell containing a point and its neighbours
    #[command(allow_negative_numbers = true)]
    QueryPoint { snapshot: PathBuf, lat: f64, lng: f64 },
    /// Roads in every cell overlapping a bounding box
    #[command(allow_negative_numbers = true)]
    QueryBbox {
        snapshot: PathBuf,
        min_lat: f64,
        min_lng: f64,
        max_lat: f64,
        max_lng: f64,
    },
    /// Roads in every cell within a radius of a point
    #[command(allow_negative_numbers = true)]
    QueryRadius { snapshot: PathBuf, lat: f64, lng: f64, radius_m: f64 },
    /// The `k` roads with a vertex closest to a point
    #[command(allow_negative_numbers = true)]
    Nearest {
        snapshot: PathBuf,
        lat: f64,
        lng: f64,
        #[arg(short, default_value_t = 3)]
        k: usize,
    },
    /// Roads whose name contains a string (case-insensitive)
    FindName { snapshot: PathBuf, needle: String },
    /// Roads of one `highway` class
    FindType { snapshot: PathBuf, road_class: String },
    /// Turn restrictions from one road onto another
    Restrictions { snapshot: PathBuf, from: i64, to: i64 },
    /// Store statistics
    Stats { snapshot: PathBuf },
    /// Export a snapshot's contents
    Export {
        snapshot: PathBuf,
        /// Output directory
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// Cell token to export (GeoJSON only; default: every cell)
        #[arg(long)]
        cell: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExportFormat {
    Csv,
    Geojson,
    #[cfg(feature = "sqlite")]
    Sqlite,
}

fn parse_floats<const N: usize>(s: &str) -> Result<[f64; N]> {
    let parts: Vec<f64> = s.split(',').map(|p| p.trim().parse()).collect::<Result<_, _>>()?;
    match <[f64; N]>::try_from(parts) {
        Ok(a) => Ok(a),
        Err(parts) => bail!("expected {N} comma-separated numbers, got {}", parts.len()),
    }
}

fn parse_bbox(s: &str) -> Result<BoundingBox> {
    let [min_lat, min_lng, max_lat, max_lng] = parse_floats(s)?;
    Ok(BoundingBox::new(min_lat, min_lng, max_lat, max_lng)?)
}

fn parse_around(s: &str) -> Result<(f64, f64, f64)> {
    let [lat, lng, radius_m] = parse_floats(s)?;
    Ok((lat, lng, radius_m))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = MapConfig {
        level:         cli.level,
        storage_dir:   cli.storage_dir,
        write_summary: !cli.no_summary,
    };
    config.validate()?;

    match cli.command {
        Command::Ingest { input, snapshot, bbox, around, road_types, timeout_secs } => {
            let area = match around {
                Some((lat, lng, radius_m)) => commands::Area::Around { lat, lng, radius_m },
                None => commands::Area::Bbox(bbox.unwrap_or(BoundingBox::WORLD)),
            };
            commands::ingest(config, &input, &snapshot, area, road_types, timeout_secs)
        }
        Command::QueryPoint { snapshot, lat, lng } => {
            let manager = commands::open(config, &snapshot)?;
            commands::print_json(&manager.query_point(lat, lng)?)
        }
        Command::QueryBbox { snapshot, min_lat, min_lng, max_lat, max_lng } => {
            let manager = commands::open(config, &snapshot)?;
            let bbox = BoundingBox::new(min_lat, min_lng, max_lat, max_lng)?;
            commands::print_json(&manager.query_bbox(&bbox)?)
        }
        Command::QueryRadius { snapshot, lat, lng, radius_m } => {
            let manager = commands::open(config, &snapshot)?;
            commands::print_json(&manager.query_radius(lat, lng, radius_m)?)
        }
        Command::Nearest { snapshot, lat, lng, k } => {
            let manager = commands::open(config, &snapshot)?;
            commands::print_json(&manager.nearest_roads(lat, lng, k)?)
        }
        Command::FindName { snapshot, needle } => {
            let manager = commands::open(config, &snapshot)?;
            commands::print_roads(&manager.roads_by_name(&needle)?)
        }
        Command::FindType { snapshot, road_class } => {
            let manager = commands::open(config, &snapshot)?;
            commands::print_roads(&manager.roads_by_type(&road_class)?)
        }
        Command::Restrictions { snapshot, from, to } => {
            let manager = commands::open(config, &snapshot)?;
            commands::print_json(&manager.route_restrictions(from.into(), to.into())?)
        }
        Command::Stats { snapshot } => {
            let manager = commands::open(config, &snapshot)?;
            commands::print_json(&manager.statistics()?)
        }
        Command::Export { snapshot, out, format, cell } => {
            let manager = commands::open(config, &snapshot)?;
            commands::export(&manager, &out, format, cell.as_deref())
        }
    }
}
