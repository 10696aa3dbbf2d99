//! Tests for the subcommand handlers, run against the bundled sample extract.

use std::path::Path;

use cm_core::{BoundingBox, MapConfig, RoadId};

use crate::ExportFormat;
use crate::commands::{self, Area};

const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/sample_overpass.json");

fn config_in(dir: &Path) -> MapConfig {
    MapConfig { storage_dir: dir.to_path_buf(), ..MapConfig::default() }
}

fn ingest_sample(dir: &Path) -> MapConfig {
    let config = config_in(dir);
    commands::ingest(
        config.clone(),
        Path::new(SAMPLE),
        Path::new("sf.cmss"),
        Area::Bbox(BoundingBox::WORLD),
        Vec::new(),
        None,
    )
    .unwrap();
    config
}

#[cfg(test)]
mod snapshots {
    use super::*;

    #[test]
    fn ingested_sample_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let config = ingest_sample(dir.path());
        assert!(dir.path().join("sf.cmss").exists());
        assert!(dir.path().join("sf_summary.json").exists());

        let manager = commands::open(config, Path::new("sf.cmss")).unwrap();
        assert!(manager.statistics().unwrap().unique_road_count > 0);
        let (_, market) = manager.find_road_by_id(RoadId(5001)).unwrap().unwrap();
        assert_eq!(market.metadata.name.as_deref(), Some("Market Street"));
        assert!(manager.find_road_by_id(RoadId(5006)).unwrap().is_none());
    }

    #[test]
    fn road_types_limit_ingest() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        commands::ingest(
            config.clone(),
            Path::new(SAMPLE),
            Path::new("primary.cmss"),
            Area::Bbox(BoundingBox::WORLD),
            vec!["primary".to_string()],
            None,
        )
        .unwrap();

        let manager = commands::open(config, Path::new("primary.cmss")).unwrap();
        assert!(manager.find_road_by_id(RoadId(5001)).unwrap().is_some());
        assert!(manager.find_road_by_id(RoadId(5003)).unwrap().is_none());
    }

    #[test]
    fn missing_snapshot_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        assert!(commands::open(config_in(dir.path()), Path::new("nope.cmss")).is_err());
    }
}

#[cfg(test)]
mod export {
    use super::*;

    #[test]
    fn csv_export_writes_tables() {
        let dir = tempfile::tempdir().unwrap();
        let config = ingest_sample(dir.path());
        let manager = commands::open(config, Path::new("sf.cmss")).unwrap();

        let out = dir.path().join("csv");
        commands::export(&manager, &out, ExportFormat::Csv, None).unwrap();
        assert!(out.join("roads.csv").exists());
        assert!(out.join("cells.csv").exists());
    }

    #[test]
    fn geojson_export_of_one_cell() {
        let dir = tempfile::tempdir().unwrap();
        let config = ingest_sample(dir.path());
        let manager = commands::open(config, Path::new("sf.cmss")).unwrap();
        let (cell, _) = manager.find_road_by_id(RoadId(5001)).unwrap().unwrap();

        let out = dir.path().join("geo");
        let token = cell.to_token();
        commands::export(&manager, &out, ExportFormat::Geojson, Some(&token)).unwrap();
        assert!(out.join(format!("cell_{token}.geojson")).exists());

        commands::export(&manager, &out, ExportFormat::Geojson, None).unwrap();
        assert!(out.join("roads.geojson").exists());
    }

    #[test]
    fn cell_of_another_level_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = ingest_sample(dir.path());
        let manager = commands::open(config, Path::new("sf.cmss")).unwrap();
        let coarse = manager.index().cell_id(37.7749, -122.4194).unwrap().parent(10).unwrap();

        let err = commands::export(&manager, dir.path(), ExportFormat::Geojson, Some(&coarse.to_token()))
            .unwrap_err();
        assert!(err.to_string().contains("not a level 15 cell"), "{err}");
    }

    #[test]
    fn cell_filter_needs_geojson() {
        let dir = tempfile::tempdir().unwrap();
        let config = ingest_sample(dir.path());
        let manager = commands::open(config, Path::new("sf.cmss")).unwrap();
        assert!(commands::export(&manager, dir.path(), ExportFormat::Csv, Some("89")).is_err());
    }
}
