//! Strongly typed wrappers around OpenStreetMap identifiers.
//!
//! OSM ids are signed 64-bit integers and are only ever compared, hashed and
//! printed — never used as `Vec` indexes — so unlike dense arena ids these
//! wrappers carry no `index()` helper.  `Display` uses the OSM
//! `type/id` convention (`way/42`), which is also what the CLI prints.

use std::fmt;

/// Generate a typed OSM id wrapper around `i64`.
macro_rules! osm_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident => $prefix:literal;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        $vis struct $name(pub i64);

        impl $name {
            /// The raw OSM integer id.
            #[inline(always)]
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "/{}"), self.0)
            }
        }

        impl From<i64> for $name {
            #[inline(always)]
            fn from(id: i64) -> $name {
                $name(id)
            }
        }

        impl From<$name> for i64 {
            #[inline(always)]
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

osm_id! {
    /// Id of a road (an OSM way carrying a `highway` tag).
    pub struct RoadId => "way";
}

osm_id! {
    /// Id of an OSM node (road vertex or intersection).
    pub struct OsmNodeId => "node";
}

osm_id! {
    /// Id of an OSM relation (turn restrictions).
    pub struct RelationId => "relation";
}
