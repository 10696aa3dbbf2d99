//! Reader for Overpass API JSON output (`[out:json]`).
//!
//! Expects the shape produced by a query such as
//!
//! ```text
//! [out:json];
//! (way["highway"](bbox); relation["type"="restriction"](bbox););
//! (._;>;);
//! out body;
//! ```
//!
//! i.e. a flat `elements` array of nodes, ways and relations.  Only ways with
//! a `highway` tag become roads and only `type=restriction` relations become
//! restrictions; everything else is used for node positions or ignored.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::warn;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use cm_core::{GeoPoint, OsmNodeId, RelationId, RoadId};

use crate::raw::{RawMember, RawRestriction, RawRoad, Tags};
use crate::region::RawRegion;
use crate::FetchResult;

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Element {
    Node {
        id:   i64,
        lat:  f64,
        lon:  f64,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Way {
        id:    i64,
        #[serde(default)]
        nodes: Vec<i64>,
        #[serde(default)]
        tags:  BTreeMap<String, String>,
    },
    Relation {
        id:      i64,
        #[serde(default)]
        members: Vec<Member>,
        #[serde(default)]
        tags:    BTreeMap<String, String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct Member {
    #[serde(rename = "type")]
    kind:      String,
    #[serde(rename = "ref")]
    reference: i64,
    #[serde(default)]
    role:      String,
}

/// Parse an Overpass JSON document from a reader.
pub fn read<R: Read>(reader: R) -> FetchResult<RawRegion> {
    let doc: Document = serde_json::from_reader(reader)?;
    Ok(build(doc))
}

/// Parse an Overpass JSON document from a string.
pub fn from_str(json: &str) -> FetchResult<RawRegion> {
    let doc: Document = serde_json::from_str(json)?;
    Ok(build(doc))
}

/// Parse an Overpass JSON file.
pub fn read_path(path: &Path) -> FetchResult<RawRegion> {
    let file = File::open(path)?;
    read(BufReader::new(file))
}

fn build(doc: Document) -> RawRegion {
    let mut positions: FxHashMap<OsmNodeId, GeoPoint> = FxHashMap::default();
    let mut node_tags: FxHashMap<OsmNodeId, Tags> = FxHashMap::default();
    let mut ways = Vec::new();
    let mut restrictions = Vec::new();

    for element in doc.elements {
        match element {
            Element::Node { id, lat, lon, tags } => {
                positions.insert(OsmNodeId(id), GeoPoint::new(lat, lon));
                if !tags.is_empty() {
                    node_tags.insert(OsmNodeId(id), tags);
                }
            }
            Element::Way { id, nodes, tags } => {
                if tags.contains_key("highway") {
                    ways.push((id, nodes, tags));
                }
            }
            Element::Relation { id, members, tags } => {
                if tags.get("type").map(String::as_str) == Some("restriction") {
                    restrictions.push(RawRestriction {
                        id: RelationId(id),
                        members: members
                            .into_iter()
                            .map(|m| RawMember { kind: m.kind, reference: m.reference, role: m.role })
                            .collect(),
                        tags,
                    });
                }
            }
            Element::Other => {}
        }
    }

    let mut unresolved = 0usize;
    let roads = ways
        .into_iter()
        .map(|(id, refs, tags)| {
            let mut nodes = Vec::with_capacity(refs.len());
            let mut coords = Vec::with_capacity(refs.len());
            for node in refs.into_iter().map(OsmNodeId) {
                match positions.get(&node) {
                    Some(&p) => {
                        nodes.push(node);
                        coords.push(p);
                    }
                    None => unresolved += 1,
                }
            }
            RawRoad { id: RoadId(id), nodes, coords, tags }
        })
        .collect();

    if unresolved > 0 {
        warn!("{unresolved} way node references had no position and were dropped");
    }

    RawRegion::from_parts(roads, restrictions, &node_tags)
}
