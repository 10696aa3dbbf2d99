//! Plain data row types written by tabular backends.

use cm_cell::CellId;
use cm_store::{CellRecord, RoadSegment};

/// One road entry in one cell.  A road spanning several cells yields one
/// row per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadRow {
    pub cell:            String,
    pub road_id:         i64,
    pub name:            Option<String>,
    pub road_class:      String,
    pub oneway:          bool,
    pub speed_limit_kph: Option<u16>,
    pub lanes:           Option<u8>,
    pub vertex_count:    usize,
    pub length_m:        f64,
}

impl RoadRow {
    pub fn new(cell: CellId, segment: &RoadSegment) -> Self {
        let m = &segment.metadata;
        Self {
            cell:            cell.to_token(),
            road_id:         segment.id.get(),
            name:            m.name.clone(),
            road_class:      m.road_class.clone(),
            oneway:          m.oneway,
            speed_limit_kph: m.speed_limit_kph,
            lanes:           m.lanes,
            vertex_count:    segment.vertices.len(),
            length_m:        segment.length_m(),
        }
    }
}

/// Per-cell counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRow {
    pub cell_id:                u64,
    pub level:                  u8,
    pub center_lat:             f64,
    pub center_lng:             f64,
    pub road_count:             usize,
    pub intersection_count:     usize,
    pub restriction_count:      usize,
    pub last_updated_unix_secs: u64,
}

impl CellRow {
    pub fn new(cell: CellId, record: &CellRecord) -> Self {
        let center = cell.center();
        Self {
            cell_id:                cell.0,
            level:                  cell.level(),
            center_lat:             center.lat,
            center_lng:             center.lng,
            road_count:             record.roads().len(),
            intersection_count:     record.intersections().len(),
            restriction_count:      record.restrictions().len(),
            last_updated_unix_secs: record.meta().last_updated_unix_secs,
        }
    }
}
