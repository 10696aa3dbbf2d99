//! Subcommand handlers.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use log::{info, warn};
use memory_stats::memory_stats;
use serde_json::json;

use cm_cell::CellId;
use cm_core::{BoundingBox, MapConfig};
use cm_export::{CsvWriter, export_store, geojson};
use cm_fetch::{RegionFetcher, StaticFetcher};
use cm_manager::{LoadOptions, MapManager};
use cm_store::RoadSegment;

use crate::ExportFormat;

type Manager = MapManager<Box<dyn RegionFetcher>>;

/// Where an ingest should look for roads.
pub enum Area {
    Bbox(BoundingBox),
    Around { lat: f64, lng: f64, radius_m: f64 },
}

// ── Memory helper ─────────────────────────────────────────────────────────────

fn mem_mb() -> f64 {
    memory_stats()
        .map(|s| s.physical_mem as f64 / (1024.0 * 1024.0))
        .unwrap_or(0.0)
}

// ── Output ────────────────────────────────────────────────────────────────────

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_roads(hits: &[(CellId, RoadSegment)]) -> Result<()> {
    let rows: Vec<_> = hits
        .iter()
        .map(|(cell, road)| json!({ "cell": cell.to_token(), "road": road }))
        .collect();
    print_json(&rows)
}

// ── Managers ──────────────────────────────────────────────────────────────────

fn fetcher_for(input: &Path) -> Result<Box<dyn RegionFetcher>> {
    let is_pbf = input.extension().is_some_and(|e| e.eq_ignore_ascii_case("pbf"));
    if is_pbf {
        #[cfg(feature = "pbf")]
        return Ok(Box::new(cm_fetch::PbfFetcher::open(input)?));
        #[cfg(not(feature = "pbf"))]
        bail!("{} looks like a PBF file; rebuild with `--features pbf`", input.display());
    }
    let fetcher = StaticFetcher::from_overpass_path(input)
        .with_context(|| format!("reading {}", input.display()))?;
    Ok(Box::new(fetcher))
}

/// A manager holding the snapshot at `path` and no data source.
pub fn open(config: MapConfig, snapshot: &Path) -> Result<Manager> {
    let fetcher: Box<dyn RegionFetcher> = Box::new(StaticFetcher::default());
    let manager = MapManager::new(config, fetcher)?;
    manager
        .load(snapshot)
        .with_context(|| format!("loading snapshot {}", snapshot.display()))?;
    Ok(manager)
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub fn ingest(
    config: MapConfig,
    input: &Path,
    snapshot: &Path,
    area: Area,
    road_types: Vec<String>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let t0 = Instant::now();
    let manager: Manager = MapManager::new(config, fetcher_for(input)?)?;

    let mut options = LoadOptions::new();
    if !road_types.is_empty() {
        options = options.road_types(road_types);
    }
    if let Some(secs) = timeout_secs {
        options = options.timeout(Duration::from_secs(secs));
    }

    let stats = match area {
        Area::Bbox(bbox) => manager.load_region(&bbox, &options)?,
        Area::Around { lat, lng, radius_m } => manager.load_around_point(lat, lng, radius_m, &options)?,
    };
    if let Some(failure) = &stats.failure {
        warn!("ingest stopped early: {failure}");
    }
    info!(
        "committed {} roads, {} intersections, {} restrictions in {:.2?} ({:.1} MB resident)",
        stats.roads_committed,
        stats.intersections_committed,
        stats.restrictions_committed,
        t0.elapsed(),
        mem_mb(),
    );

    let written = manager.save(snapshot)?;
    print_json(&json!({
        "snapshot":   written,
        "ingest": {
            "roads":                 stats.roads_committed,
            "intersections":         stats.intersections_committed,
            "restrictions":          stats.restrictions_committed,
            "restrictions_unplaced": stats.restrictions_unplaced,
            "skipped":               stats.skipped,
            "failure":               stats.failure.as_ref().map(ToString::to_string),
        },
        "statistics": manager.statistics()?,
    }))
}

pub fn export(manager: &Manager, out: &Path, format: ExportFormat, cell: Option<&str>) -> Result<()> {
    fs::create_dir_all(out)?;
    if cell.is_some() && !matches!(format, ExportFormat::Geojson) {
        bail!("--cell only applies to GeoJSON export");
    }

    match format {
        ExportFormat::Csv => {
            let summary = manager.with_store(|store| {
                let mut writer = CsvWriter::new(out)?;
                export_store(store, &mut writer)
            })??;
            info!("exported {} cells, {} roads to {}", summary.cells, summary.roads, out.display());
        }
        #[cfg(feature = "sqlite")]
        ExportFormat::Sqlite => {
            let summary = manager.with_store(|store| {
                let mut writer = cm_export::SqliteWriter::new(out)?;
                export_store(store, &mut writer)
            })??;
            info!("exported {} cells, {} roads to {}", summary.cells, summary.roads, out.display());
        }
        ExportFormat::Geojson => {
            let collection = match cell {
                Some(token) => {
                    let cell = CellId::from_token(token)?;
                    if !manager.index().owns(cell) {
                        bail!("cell {token} is not a level {} cell", manager.index().level());
                    }
                    let Some(record) = manager.cell_contents(cell)? else {
                        bail!("cell {token} holds no data");
                    };
                    geojson::cell_feature_collection(cell, &record)
                }
                None => manager.with_store(|store| {
                    let mut roads = BTreeMap::new();
                    let mut intersections = BTreeMap::new();
                    for (_, record) in store.cells() {
                        roads.extend(record.roads().iter());
                        intersections.extend(record.intersections().iter().map(|i| (i.node, i)));
                    }
                    geojson::feature_collection(roads.into_values(), intersections.into_values())
                })?,
            };
            let path = out.join(match cell {
                Some(token) => format!("cell_{token}.geojson"),
                None => "roads.geojson".to_string(),
            });
            let features = collection.features.len();
            geojson::write_geojson(&path, collection)?;
            info!("wrote {features} features to {}", path.display());
        }
    }
    Ok(())
}
