//! OSM PBF reader — enabled with the `pbf` Cargo feature.
//!
//! # Memory note
//!
//! The reader buffers every node position in a `HashMap<i64, GeoPoint>`
//! during the pass, because ways reference nodes by id and PBF files store
//! nodes before ways.  The map is dropped once road geometry is resolved.
//! Node tags are not kept, so intersections read from PBF carry no tags.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::info;
use osmpbf::{Element, ElementReader, RelMemberType};
use rustc_hash::FxHashMap;

use cm_core::{BoundingBox, GeoPoint, OsmNodeId, RelationId, RoadId};

use crate::fetcher::{RecordStream, RegionFetcher};
use crate::raw::{RawMember, RawRestriction, RawRoad, RoadFilter, Tags};
use crate::region::RawRegion;
use crate::{FetchError, FetchResult};

// ── Public entry point ────────────────────────────────────────────────────────

/// Read every road and restriction from a PBF file.
///
/// # Errors
///
/// Returns [`FetchError::Osm`] on parse errors.
pub fn read_path(path: &Path) -> FetchResult<RawRegion> {
    let reader = ElementReader::from_path(path).map_err(|e| FetchError::Osm(e.to_string()))?;

    let mut all_nodes: HashMap<i64, GeoPoint> = HashMap::new();
    let mut ways: Vec<OsmWay> = Vec::new();
    let mut restrictions: Vec<RawRestriction> = Vec::new();

    reader
        .for_each(|elem| match elem {
            Element::Node(n) => {
                all_nodes.insert(n.id(), GeoPoint::new(n.lat(), n.lon()));
            }
            Element::DenseNode(n) => {
                all_nodes.insert(n.id(), GeoPoint::new(n.lat(), n.lon()));
            }
            Element::Way(w) => {
                let tags = owned_tags(w.tags());
                if tags.contains_key("highway") {
                    ways.push(OsmWay { id: w.id(), refs: w.refs().collect(), tags });
                }
            }
            Element::Relation(r) => {
                let tags = owned_tags(r.tags());
                if tags.get("type").map(String::as_str) == Some("restriction") {
                    let members = r
                        .members()
                        .map(|m| {
                            let role = m.role().unwrap_or_default().to_owned();
                            RawMember { kind: member_kind(&m.member_type).to_owned(), reference: m.member_id, role }
                        })
                        .collect();
                    restrictions.push(RawRestriction { id: RelationId(r.id()), members, tags });
                }
            }
        })
        .map_err(|e| FetchError::Osm(e.to_string()))?;

    let roads: Vec<RawRoad> = ways.into_iter().map(|way| resolve_way(way, &all_nodes)).collect();

    // Free the full node map before deriving intersections.
    drop(all_nodes);

    info!(
        "read {} roads and {} restrictions from {}",
        roads.len(),
        restrictions.len(),
        path.display(),
    );

    Ok(RawRegion::from_parts(roads, restrictions, &FxHashMap::default()))
}

// ── PbfFetcher ────────────────────────────────────────────────────────────────

/// Serves bounding-box requests from a PBF extract.
///
/// The file is parsed once on construction; requests clip the parsed region.
pub struct PbfFetcher {
    path:   PathBuf,
    region: RawRegion,
}

impl PbfFetcher {
    pub fn open(path: impl Into<PathBuf>) -> FetchResult<Self> {
        let path = path.into();
        let region = read_path(&path)?;
        Ok(Self { path, region })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegionFetcher for PbfFetcher {
    fn fetch_region(&self, bbox: &BoundingBox, filter: &RoadFilter)
        -> FetchResult<RecordStream<'_>>
    {
        let clipped = self.region.clip(bbox, filter);
        Ok(Box::new(clipped.into_records().map(Ok)))
    }
}

// ── Internal types ────────────────────────────────────────────────────────────

pub(crate) struct OsmWay {
    pub(crate) id:   i64,
    pub(crate) refs: Vec<i64>,
    pub(crate) tags: Tags,
}

/// Attach positions to a way's node refs.  Refs outside the extract are
/// dropped along with their position.
pub(crate) fn resolve_way(way: OsmWay, positions: &HashMap<i64, GeoPoint>) -> RawRoad {
    let (nodes, coords) = way
        .refs
        .iter()
        .filter_map(|id| positions.get(id).map(|&p| (OsmNodeId(*id), p)))
        .unzip();
    RawRoad { id: RoadId(way.id), nodes, coords, tags: way.tags }
}

fn owned_tags<'a>(tags: impl Iterator<Item = (&'a str, &'a str)>) -> Tags {
    tags.map(|(k, v)| (k.to_owned(), v.to_owned())).collect()
}

pub(crate) fn member_kind(kind: &RelMemberType) -> &'static str {
    match kind {
        RelMemberType::Node => "node",
        RelMemberType::Way => "way",
        RelMemberType::Relation => "relation",
    }
}
