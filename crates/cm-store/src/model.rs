//! Stored record types: `RoadSegment`, `Intersection`, `TurnRestriction`.
//!
//! Raw OSM tags are preserved verbatim on every record.  `RoadMetadata` is
//! derived from them once, on construction, so queries never re-parse tags.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use cm_core::{GeoPoint, OsmNodeId, RelationId, RoadId};

/// Free-form OSM tag map.
pub type Tags = BTreeMap<String, String>;

const KM_PER_MILE: f64 = 1.609_344;

// ── RoadSegment ───────────────────────────────────────────────────────────────

/// One road: an OSM way with its geometry and parsed metadata.
///
/// A segment is replaced wholesale when a road with the same id is
/// re-inserted; it is never edited in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoadSegment {
    pub id:       RoadId,
    /// Node ids in way order, parallel to `vertices`.
    pub nodes:    Vec<OsmNodeId>,
    pub vertices: Vec<GeoPoint>,
    pub tags:     Tags,
    pub metadata: RoadMetadata,
}

impl RoadSegment {
    /// Build a segment and derive its metadata from `tags`.
    pub fn new(id: RoadId, nodes: Vec<OsmNodeId>, vertices: Vec<GeoPoint>, tags: Tags) -> Self {
        let metadata = RoadMetadata::from_tags(&tags);
        Self { id, nodes, vertices, tags, metadata }
    }

    /// Polyline length in metres.
    pub fn length_m(&self) -> f64 {
        self.vertices.windows(2).map(|w| w[0].distance_m(w[1])).sum()
    }

    /// The vertex halfway along the vertex list.
    pub fn middle_vertex(&self) -> Option<GeoPoint> {
        self.vertices.get(self.vertices.len() / 2).copied()
    }

    /// Position of `node` on this road, if the road passes through it.
    pub fn position_of(&self, node: OsmNodeId) -> Option<GeoPoint> {
        self.nodes
            .iter()
            .position(|&n| n == node)
            .and_then(|k| self.vertices.get(k).copied())
    }
}

/// Road attributes parsed from OSM tags.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadMetadata {
    pub name:            Option<String>,
    /// `highway` value, `"unknown"` when absent.
    pub road_class:      String,
    pub oneway:          bool,
    /// `maxspeed` normalised to km/h; `None` when absent or not numeric
    /// (`none`, `signals`, `walk`, ...).
    pub speed_limit_kph: Option<u16>,
    pub lanes:           Option<u8>,
    pub surface:         Option<String>,
    pub access:          Option<String>,
    pub bridge:          bool,
    pub tunnel:          bool,
    pub toll:            bool,
    /// Route reference number (`ref`), e.g. `"US 101"`.
    pub reference:       Option<String>,
}

impl RoadMetadata {
    pub fn from_tags(tags: &Tags) -> Self {
        let get = |k: &str| tags.get(k).map(String::as_str);
        let road_class = get("highway").unwrap_or("unknown");

        Self {
            name:            get("name").map(str::to_owned),
            road_class:      road_class.to_owned(),
            oneway:          is_oneway(road_class, get("oneway"), get("junction")),
            speed_limit_kph: get("maxspeed").and_then(parse_maxspeed),
            lanes:           get("lanes").and_then(|v| v.trim().parse().ok()),
            surface:         get("surface").map(str::to_owned),
            access:          get("access").map(str::to_owned),
            bridge:          is_set(get("bridge")),
            tunnel:          is_set(get("tunnel")),
            toll:            matches!(get("toll"), Some("yes")),
            reference:       get("ref").map(str::to_owned),
        }
    }
}

/// Whether a way is one-way for car traffic.
///
/// Motorways, motorway links and roundabouts are implicitly one-way in OSM
/// convention; an explicit `oneway=no` overrides that.
fn is_oneway(highway: &str, oneway: Option<&str>, junction: Option<&str>) -> bool {
    match oneway {
        Some("yes" | "1" | "true" | "-1") => true,
        Some("no" | "0" | "false") => false,
        _ => matches!(highway, "motorway" | "motorway_link") || junction == Some("roundabout"),
    }
}

fn is_set(value: Option<&str>) -> bool {
    matches!(value, Some(v) if v != "no")
}

/// Parse an OSM `maxspeed` value into whole km/h.
///
/// Accepts `"50"`, `"50 km/h"`, `"50kmh"`, `"30 mph"`.
pub fn parse_maxspeed(raw: &str) -> Option<u16> {
    let value = raw.trim().to_ascii_lowercase();
    let (number, factor) = if let Some(n) = value.strip_suffix("mph") {
        (n, KM_PER_MILE)
    } else if let Some(n) = ["km/h", "kmh", "kph"].iter().find_map(|s| value.strip_suffix(s)) {
        (n, 1.0)
    } else {
        (value.as_str(), 1.0)
    };

    let speed: f64 = number.trim().parse().ok()?;
    let kph = (speed * factor).round();
    (kph.is_finite() && kph > 0.0 && kph <= f64::from(u16::MAX)).then_some(kph as u16)
}

// ── Intersection ──────────────────────────────────────────────────────────────

/// A node where two or more roads meet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    pub node:  OsmNodeId,
    pub point: GeoPoint,
    pub roads: BTreeSet<RoadId>,
    pub tags:  Tags,
}

// ── TurnRestriction ───────────────────────────────────────────────────────────

/// Kind of turn restriction, from the relation's `restriction` tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RestrictionKind {
    NoLeftTurn,
    NoRightTurn,
    NoStraightOn,
    NoUTurn,
    NoEntry,
    NoExit,
    OnlyLeftTurn,
    OnlyRightTurn,
    OnlyStraightOn,
    OnlyUTurn,
    /// Any other value, verbatim (empty when the tag is missing).
    Other(String),
}

impl RestrictionKind {
    /// Kind from a restriction relation's tags: `restriction`, else the
    /// first mode-specific `restriction:<mode>` tag.
    pub fn from_tags(tags: &Tags) -> Self {
        tags.get("restriction")
            .or_else(|| {
                tags.iter()
                    .find(|(k, _)| k.starts_with("restriction:"))
                    .map(|(_, v)| v)
            })
            .map_or(RestrictionKind::Other(String::new()), |v| RestrictionKind::from(v.as_str()))
    }

    /// The OSM tag value.
    pub fn as_tag(&self) -> &str {
        match self {
            RestrictionKind::NoLeftTurn => "no_left_turn",
            RestrictionKind::NoRightTurn => "no_right_turn",
            RestrictionKind::NoStraightOn => "no_straight_on",
            RestrictionKind::NoUTurn => "no_u_turn",
            RestrictionKind::NoEntry => "no_entry",
            RestrictionKind::NoExit => "no_exit",
            RestrictionKind::OnlyLeftTurn => "only_left_turn",
            RestrictionKind::OnlyRightTurn => "only_right_turn",
            RestrictionKind::OnlyStraightOn => "only_straight_on",
            RestrictionKind::OnlyUTurn => "only_u_turn",
            RestrictionKind::Other(v) => v,
        }
    }

    /// `only_*` restrictions forbid every turn but one.
    pub fn is_mandatory(&self) -> bool {
        self.as_tag().starts_with("only_")
    }
}

impl From<&str> for RestrictionKind {
    fn from(s: &str) -> Self {
        match s {
            "no_left_turn" => RestrictionKind::NoLeftTurn,
            "no_right_turn" => RestrictionKind::NoRightTurn,
            "no_straight_on" => RestrictionKind::NoStraightOn,
            "no_u_turn" => RestrictionKind::NoUTurn,
            "no_entry" => RestrictionKind::NoEntry,
            "no_exit" => RestrictionKind::NoExit,
            "only_left_turn" => RestrictionKind::OnlyLeftTurn,
            "only_right_turn" => RestrictionKind::OnlyRightTurn,
            "only_straight_on" => RestrictionKind::OnlyStraightOn,
            "only_u_turn" => RestrictionKind::OnlyUTurn,
            other => RestrictionKind::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for RestrictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    Way,
    Node,
    Relation,
}

impl MemberKind {
    /// `"way"`, `"node"` or `"relation"`; anything else is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "way" => Some(MemberKind::Way),
            "node" => Some(MemberKind::Node),
            "relation" => Some(MemberKind::Relation),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberRole {
    From,
    Via,
    To,
    Other(String),
}

impl From<&str> for MemberRole {
    fn from(s: &str) -> Self {
        match s {
            "from" => MemberRole::From,
            "via" => MemberRole::Via,
            "to" => MemberRole::To,
            other => MemberRole::Other(other.to_owned()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionMember {
    pub kind:      MemberKind,
    pub reference: i64,
    pub role:      MemberRole,
}

impl RestrictionMember {
    pub fn way(id: RoadId, role: MemberRole) -> Self {
        Self { kind: MemberKind::Way, reference: id.get(), role }
    }

    pub fn node(id: OsmNodeId, role: MemberRole) -> Self {
        Self { kind: MemberKind::Node, reference: id.get(), role }
    }
}

/// An OSM `type=restriction` relation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnRestriction {
    pub id:      RelationId,
    pub kind:    RestrictionKind,
    pub members: Vec<RestrictionMember>,
    pub tags:    Tags,
}

impl TurnRestriction {
    /// Build a restriction and derive its kind from `tags`.
    pub fn new(id: RelationId, members: Vec<RestrictionMember>, tags: Tags) -> Self {
        let kind = RestrictionKind::from_tags(&tags);
        Self { id, kind, members, tags }
    }

    /// Ids of all way members, in member order.
    pub fn roads(&self) -> impl Iterator<Item = RoadId> + '_ {
        self.members
            .iter()
            .filter(|m| m.kind == MemberKind::Way)
            .map(|m| RoadId(m.reference))
    }

    /// `true` if any way member (whatever its role) is `road`.
    pub fn references_road(&self, road: RoadId) -> bool {
        self.roads().any(|r| r == road)
    }

    pub fn via_nodes(&self) -> impl Iterator<Item = OsmNodeId> + '_ {
        self.members
            .iter()
            .filter(|m| m.kind == MemberKind::Node && m.role == MemberRole::Via)
            .map(|m| OsmNodeId(m.reference))
    }
}
