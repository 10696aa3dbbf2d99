//! Region ingestion: fetch → cell assignment → per-record commit.
//!
//! ```text
//! load_region(bbox, options):
//!   ① validate bbox                 (no store access)
//!   ② fetcher.fetch_region          (no lock held)
//!   ③ take the writer gate          (readers unaffected)
//!   ④ for each record:
//!        check cancel / deadline
//!        compute target cells        (no lock held)
//!        commit                      (write lock, one record)
//! ```
//!
//! A fetch error, cancellation or deadline stops the loop; everything
//! committed so far stays and the returned stats carry the reason.

use std::collections::BTreeSet;

use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use cm_cell::CellId;
use cm_core::{BoundingBox, GeoPoint, OsmNodeId, RoadId};
use cm_fetch::{RawIntersection, RawRecord, RawRestriction, RawRoad, RegionFetcher};
use cm_store::{
    Intersection, MemberKind, MemberRole, RestrictionMember, RoadSegment, TurnRestriction,
};

use crate::error::IngestFailure;
use crate::options::{IngestStats, LoadOptions};
use crate::{ManagerResult, MapManager};

/// Positions learned from the records of one load, used to place
/// restrictions that arrive after the roads they reference.
#[derive(Default)]
struct LoadContext {
    nodes:   FxHashMap<OsmNodeId, GeoPoint>,
    middles: FxHashMap<RoadId, GeoPoint>,
}

impl<F: RegionFetcher> MapManager<F> {
    /// Fetch the records inside `bbox` and commit them one at a time.
    ///
    /// # Errors
    ///
    /// `InvalidCoordinate` for a malformed box, before anything is fetched.
    /// Fetch failures are not errors: they end the load early and are
    /// reported in [`IngestStats::failure`].
    pub fn load_region(&self, bbox: &BoundingBox, options: &LoadOptions) -> ManagerResult<IngestStats> {
        let bbox = BoundingBox::new(bbox.min_lat, bbox.min_lng, bbox.max_lat, bbox.max_lng)?;
        info!("loading region {bbox} at level {}", self.index.level());

        let mut stats = IngestStats::default();
        if let Some(reason) = options.interruption() {
            stats.failure = Some(reason);
            return Ok(stats);
        }

        let stream = match self.fetcher.fetch_region(&bbox, &options.filter) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("fetch for {bbox} failed: {e}");
                stats.failure = Some(IngestFailure::Fetch(e));
                return Ok(stats);
            }
        };

        // Held until every record is in, so `load`, `save` and `clear` see
        // either none of this region or all of it.
        let _gate = self.exclusive()?;
        let mut ctx = LoadContext::default();
        for item in stream {
            let record = match item {
                Ok(record) => record,
                Err(e) => {
                    stats.failure = Some(IngestFailure::Fetch(e));
                    break;
                }
            };
            if let Some(reason) = options.interruption() {
                stats.failure = Some(reason);
                break;
            }

            match record {
                RawRecord::Road(raw) => self.commit_road(raw, options, &mut ctx, &mut stats)?,
                RawRecord::Intersection(raw) => self.commit_intersection(raw, &mut ctx, &mut stats)?,
                RawRecord::Restriction(raw) => self.commit_restriction(raw, &ctx, &mut stats)?,
            }
        }

        match &stats.failure {
            Some(reason) => warn!(
                "partial load of {bbox}: {reason}; kept {} roads, {} intersections, {} restrictions",
                stats.roads_committed, stats.intersections_committed, stats.restrictions_committed,
            ),
            None => info!(
                "loaded {} roads, {} intersections, {} restrictions ({} skipped, {} unplaced)",
                stats.roads_committed,
                stats.intersections_committed,
                stats.restrictions_committed,
                stats.skipped,
                stats.restrictions_unplaced,
            ),
        }
        Ok(stats)
    }

    /// Load the bounding box of the circle of `radius_m` around `(lat, lng)`,
    /// clamped to valid coordinates.
    pub fn load_around_point(
        &self,
        lat: f64,
        lng: f64,
        radius_m: f64,
        options: &LoadOptions,
    ) -> ManagerResult<IngestStats> {
        let bbox = BoundingBox::around(GeoPoint::try_new(lat, lng)?, radius_m)?;
        self.load_region(&bbox, options)
    }

    // ── Per-record commits ────────────────────────────────────────────────

    fn commit_road(
        &self,
        raw: RawRoad,
        options: &LoadOptions,
        ctx: &mut LoadContext,
        stats: &mut IngestStats,
    ) -> ManagerResult<()> {
        if !options.filter.accepts(raw.road_class()) {
            stats.skipped += 1;
            return Ok(());
        }
        if raw.coords.is_empty() || raw.coords.iter().any(|p| !p.is_valid()) {
            debug!("skipping {}: missing or invalid geometry", raw.id);
            stats.skipped += 1;
            return Ok(());
        }

        // Vertex-based covering: every cell a vertex falls in.
        let cells = raw
            .coords
            .iter()
            .map(|&p| self.index.cell_of(p))
            .collect::<Result<BTreeSet<CellId>, _>>()?;

        ctx.nodes.extend(raw.vertices());
        let segment = RoadSegment::new(raw.id, raw.nodes, raw.coords, raw.tags);
        if let Some(mid) = segment.middle_vertex() {
            ctx.middles.insert(segment.id, mid);
        }

        let id = segment.id;
        self.write()?.upsert_road_cells(&cells, segment)?;
        debug!("committed {id} into {} cells", cells.len());
        stats.roads_committed += 1;
        Ok(())
    }

    fn commit_intersection(
        &self,
        raw: RawIntersection,
        ctx: &mut LoadContext,
        stats: &mut IngestStats,
    ) -> ManagerResult<()> {
        if !raw.point.is_valid() {
            debug!("skipping intersection {}: invalid point", raw.node);
            stats.skipped += 1;
            return Ok(());
        }
        let cell = self.index.cell_of(raw.point)?;
        ctx.nodes.insert(raw.node, raw.point);

        let intersection = Intersection {
            node:  raw.node,
            point: raw.point,
            roads: raw.roads.into_iter().collect(),
            tags:  raw.tags,
        };
        if self.write()?.add_intersection(cell, intersection)? {
            debug!("committed intersection {} into {}", raw.node, cell.to_token());
            stats.intersections_committed += 1;
        }
        Ok(())
    }

    fn commit_restriction(
        &self,
        raw: RawRestriction,
        ctx: &LoadContext,
        stats: &mut IngestStats,
    ) -> ManagerResult<()> {
        let members: Vec<RestrictionMember> = raw
            .members
            .iter()
            .filter_map(|m| {
                let kind = MemberKind::parse(&m.kind)?;
                Some(RestrictionMember { kind, reference: m.reference, role: MemberRole::from(m.role.as_str()) })
            })
            .collect();
        let restriction = TurnRestriction::new(raw.id, members, raw.tags);

        let cells = self.restriction_cells(&restriction, ctx)?;
        if cells.is_empty() {
            debug!("cannot place {}: no known via node or member way", restriction.id);
            stats.restrictions_unplaced += 1;
            return Ok(());
        }

        let placed = cells.len();
        let mut store = self.write()?;
        let mut added = false;
        for cell in cells {
            added |= store.add_turn_restriction(cell, restriction.clone())?;
        }
        drop(store);
        if added {
            debug!("committed {} into {} cells", restriction.id, placed);
            stats.restrictions_committed += 1;
        }
        Ok(())
    }

    /// Cells a restriction belongs in: those of its via nodes, else those of
    /// the middle vertex of each member way.
    fn restriction_cells(&self, restriction: &TurnRestriction, ctx: &LoadContext) -> ManagerResult<BTreeSet<CellId>> {
        let via: Vec<GeoPoint> = restriction
            .via_nodes()
            .filter_map(|n| ctx.nodes.get(&n).copied())
            .collect();

        let points = if via.is_empty() {
            let mut points = Vec::new();
            for road in restriction.roads() {
                let mid = match ctx.middles.get(&road) {
                    Some(&p) => Some(p),
                    None => self.with_store(|s| {
                        s.find_road_by_id(road).and_then(|(_, seg)| seg.middle_vertex())
                    })?,
                };
                points.extend(mid);
            }
            points
        } else {
            via
        };

        Ok(points
            .into_iter()
            .map(|p| self.index.cell_of(p))
            .collect::<Result<BTreeSet<CellId>, _>>()?)
    }
}
