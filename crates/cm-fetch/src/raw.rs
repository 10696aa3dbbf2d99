//! Raw records as they come off a data source, before normalization.
//!
//! Tags are kept verbatim; interpreting them (`oneway`, `maxspeed`, ...) is
//! the segment store's job.

use std::collections::{BTreeMap, BTreeSet};

use cm_core::{GeoPoint, OsmNodeId, RelationId, RoadId};

/// Free-form OSM tag map.
pub type Tags = BTreeMap<String, String>;

/// Road class reported for ways without a `highway` tag.
pub const UNKNOWN_CLASS: &str = "unknown";

// ── Records ───────────────────────────────────────────────────────────────────

/// One road (an OSM way carrying a `highway` tag).
///
/// `nodes` and `coords` are parallel: `coords[k]` is the position of
/// `nodes[k]`.  Node references whose position the source could not resolve
/// are dropped from both.
#[derive(Clone, Debug, PartialEq)]
pub struct RawRoad {
    pub id:     RoadId,
    pub nodes:  Vec<OsmNodeId>,
    pub coords: Vec<GeoPoint>,
    pub tags:   Tags,
}

impl RawRoad {
    /// The `highway` value, or `"unknown"`.
    pub fn road_class(&self) -> &str {
        self.tags.get("highway").map_or(UNKNOWN_CLASS, String::as_str)
    }

    /// `(node, position)` pairs in way order.
    pub fn vertices(&self) -> impl Iterator<Item = (OsmNodeId, GeoPoint)> + '_ {
        self.nodes.iter().copied().zip(self.coords.iter().copied())
    }
}

/// A node shared by two or more roads.
#[derive(Clone, Debug, PartialEq)]
pub struct RawIntersection {
    pub node:  OsmNodeId,
    pub point: GeoPoint,
    /// Distinct roads through this node, ascending.
    pub roads: Vec<RoadId>,
    pub tags:  Tags,
}

/// One member of a restriction relation, untyped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawMember {
    /// `"way"`, `"node"` or `"relation"`.
    pub kind:      String,
    pub reference: i64,
    /// `"from"`, `"via"`, `"to"`, or anything else the source carries.
    pub role:      String,
}

/// A `type=restriction` relation.
#[derive(Clone, Debug, PartialEq)]
pub struct RawRestriction {
    pub id:      RelationId,
    pub members: Vec<RawMember>,
    pub tags:    Tags,
}

impl RawRestriction {
    /// Ids of way members with the given role.
    pub fn ways_with_role<'a>(&'a self, role: &'a str) -> impl Iterator<Item = RoadId> + 'a {
        self.members
            .iter()
            .filter(move |m| m.kind == "way" && m.role == role)
            .map(|m| RoadId(m.reference))
    }

    /// Ids of node members with role `via`.
    pub fn via_nodes(&self) -> impl Iterator<Item = OsmNodeId> + '_ {
        self.members
            .iter()
            .filter(|m| m.kind == "node" && m.role == "via")
            .map(|m| OsmNodeId(m.reference))
    }
}

/// One item of a fetch stream.
#[derive(Clone, Debug, PartialEq)]
pub enum RawRecord {
    Road(RawRoad),
    Intersection(RawIntersection),
    Restriction(RawRestriction),
}

// ── RoadFilter ────────────────────────────────────────────────────────────────

/// Which road classes a load should keep.  The default keeps everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoadFilter {
    classes: Option<BTreeSet<String>>,
}

impl RoadFilter {
    /// Accept every road class.
    pub fn all() -> Self {
        Self { classes: None }
    }

    /// Accept only the listed `highway` values.
    pub fn only<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { classes: Some(classes.into_iter().map(Into::into).collect()) }
    }

    /// `None` when unrestricted.
    pub fn classes(&self) -> Option<&BTreeSet<String>> {
        self.classes.as_ref()
    }

    pub fn accepts(&self, road_class: &str) -> bool {
        match &self.classes {
            None => true,
            Some(set) => set.contains(road_class),
        }
    }
}
