//! Unit tests for cm-cell.
//!
//! Property-style tests sample points with a seeded `SmallRng` so failures
//! are reproducible.

#[cfg(test)]
mod helpers {
    use cm_core::{BoundingBox, GeoPoint};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    pub fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    pub fn random_point(rng: &mut SmallRng) -> GeoPoint {
        GeoPoint::new(rng.gen_range(-90.0..=90.0), rng.gen_range(-180.0..=180.0))
    }

    /// A random box no larger than `max_span` degrees on either side.
    pub fn random_bbox(rng: &mut SmallRng, max_span: f64) -> BoundingBox {
        let a = random_point(rng);
        let lat2 = (a.lat + rng.gen_range(0.0..max_span)).min(90.0);
        let lng2 = (a.lng + rng.gen_range(0.0..max_span)).min(180.0);
        BoundingBox::new(a.lat, a.lng, lat2, lng2).unwrap()
    }

    pub fn point_in(rng: &mut SmallRng, b: &BoundingBox) -> GeoPoint {
        GeoPoint::new(
            rng.gen_range(b.min_lat..=b.max_lat),
            rng.gen_range(b.min_lng..=b.max_lng),
        )
    }
}

// ── Encoding & hierarchy ──────────────────────────────────────────────────────

#[cfg(test)]
mod encoding {
    use cm_core::{CoreError, GeoPoint};
    use rand::Rng;

    use crate::{CellId, MAX_LEVEL};

    #[test]
    fn level_zero_is_the_whole_planet() {
        let a = CellId::from_point(GeoPoint::new(-89.0, -179.0), 0).unwrap();
        let b = CellId::from_point(GeoPoint::new(89.0, 179.0), 0).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.level(), 0);
        assert_eq!(a.to_token(), "1");
    }

    #[test]
    fn level_is_recovered_from_id() {
        let p = GeoPoint::new(37.7749, -122.4194);
        for level in 0..=MAX_LEVEL {
            let cell = CellId::from_point(p, level).unwrap();
            assert!(cell.is_valid());
            assert_eq!(cell.level(), level);
        }
    }

    #[test]
    fn bounds_contain_point() {
        let mut rng = super::helpers::rng();
        for _ in 0..20_000 {
            let p = super::helpers::random_point(&mut rng);
            let level = rng.gen_range(0..=MAX_LEVEL);
            let cell = CellId::from_point(p, level).unwrap();
            let b = cell.bounds();
            assert!(b.contains(p), "{p} not in {b} (cell {cell}, level {level})");
        }
    }

    #[test]
    fn grid_corners_are_indexed() {
        for (lat, lng) in [(90.0, 180.0), (-90.0, -180.0), (90.0, -180.0), (-90.0, 180.0)] {
            let p = GeoPoint::new(lat, lng);
            let cell = CellId::from_point(p, 15).unwrap();
            assert!(cell.bounds().contains(p));
        }
    }

    #[test]
    fn points_on_an_edge_go_north_east() {
        // At level 1 the prime meridian and the equator are internal edges.
        let cell = CellId::from_point(GeoPoint::new(0.0, 0.0), 1).unwrap();
        assert_eq!(cell.to_ij(), (1, 1));
        assert_eq!(cell.bounds().min_lat, 0.0);
        assert_eq!(cell.bounds().min_lng, 0.0);
    }

    #[test]
    fn parent_and_children_agree() {
        let cell = CellId::from_point(GeoPoint::new(48.8566, 2.3522), 15).unwrap();
        let parent = cell.parent(14).unwrap();
        assert_eq!(parent.level(), 14);
        assert!(parent.contains(cell));
        assert!(!cell.contains(parent));
        assert!(!CellId(0).contains(cell));
        assert!(!parent.contains(CellId(0)));
        assert!(parent.children().unwrap().contains(&cell));
        for child in parent.children().unwrap() {
            assert_eq!(child.parent(14), Some(parent));
            assert_eq!(child.level(), 15);
        }
        assert_eq!(cell.parent(15), Some(cell));
        assert_eq!(cell.parent(16), None);
    }

    #[test]
    fn ancestors_contain_the_point() {
        let p = GeoPoint::new(-33.8688, 151.2093);
        let leaf = CellId::from_point(p, MAX_LEVEL).unwrap();
        for level in 0..=MAX_LEVEL {
            let direct = CellId::from_point(p, level).unwrap();
            assert_eq!(leaf.parent(level), Some(direct), "level {level}");
        }
        assert!(leaf.children().is_none());
    }

    #[test]
    fn token_round_trip() {
        let mut rng = super::helpers::rng();
        for _ in 0..1_000 {
            let p = super::helpers::random_point(&mut rng);
            let cell = CellId::from_point(p, rng.gen_range(0..=MAX_LEVEL)).unwrap();
            let token = cell.to_token();
            assert!(token.len() <= 16);
            assert_eq!(CellId::from_token(&token).unwrap(), cell);
            assert_eq!(token.parse::<CellId>().unwrap(), cell);
        }
    }

    #[test]
    fn malformed_tokens_rejected() {
        for token in ["", "zz", "0", "X", "12345678901234567"] {
            assert!(
                matches!(CellId::from_token(token), Err(CoreError::Parse(_))),
                "{token:?} should be rejected"
            );
        }
    }

    #[test]
    fn invalid_input_rejected() {
        assert_eq!(
            CellId::from_point(GeoPoint::new(91.0, 0.0), 10),
            Err(CoreError::InvalidCoordinate { lat: 91.0, lng: 0.0 })
        );
        assert_eq!(
            CellId::from_point(GeoPoint::new(0.0, 0.0), 31),
            Err(CoreError::InvalidLevel(31))
        );
    }
}

// ── Neighbours ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod neighbors {
    use cm_core::GeoPoint;

    use crate::CellId;

    #[test]
    fn interior_cell_has_eight_touching_neighbours() {
        let cell = CellId::from_point(GeoPoint::new(37.7749, -122.4194), 15).unwrap();
        let ns = cell.neighbors();
        assert_eq!(ns.len(), 8);
        let b = cell.bounds();
        for n in ns {
            assert_eq!(n.level(), 15);
            assert_ne!(n, cell);
            let nb = n.bounds();
            let touches = nb.min_lat <= b.max_lat
                && b.min_lat <= nb.max_lat
                && nb.min_lng <= b.max_lng
                && b.min_lng <= nb.max_lng;
            assert!(touches, "{n} does not touch {cell}");
        }
    }

    #[test]
    fn polar_row_has_five_neighbours() {
        let cell = CellId::from_point(GeoPoint::new(90.0, 10.0), 10).unwrap();
        assert_eq!(cell.neighbors().len(), 5);
    }

    #[test]
    fn neighbours_wrap_across_the_antimeridian() {
        let west = CellId::from_point(GeoPoint::new(0.5, -179.9999), 12).unwrap();
        let east = CellId::from_point(GeoPoint::new(0.5, 179.9999), 12).unwrap();
        assert!(west.neighbors().contains(&east));
        assert!(east.neighbors().contains(&west));
    }

    #[test]
    fn level_zero_has_no_neighbours() {
        let root = CellId::from_point(GeoPoint::new(0.0, 0.0), 0).unwrap();
        assert!(root.neighbors().is_empty());
    }

    #[test]
    fn edge_point_is_within_neighbourhood_of_both_sides() {
        let cell = CellId::from_point(GeoPoint::new(10.0, 10.0), 15).unwrap();
        let b = cell.bounds();
        // A point on the western edge belongs to `cell`; the cell just west of
        // it must list `cell` as a neighbour.
        let west = CellId::from_point(GeoPoint::new(b.center().lat, b.min_lng - 1e-9), 15).unwrap();
        assert_ne!(west, cell);
        assert!(west.neighbors().contains(&cell));
        assert_eq!(CellId::from_point(GeoPoint::new(b.center().lat, b.min_lng), 15).unwrap(), cell);
    }
}

// ── Coverings ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod coverings {
    use cm_core::{BoundingBox, CoreError, GeoPoint};
    use rand::Rng;

    use crate::{CellId, CellIndex, covering_for_bbox, covering_for_radius};

    #[test]
    fn bbox_covering_is_complete() {
        let mut rng = super::helpers::rng();
        for _ in 0..500 {
            let level = rng.gen_range(8..=16);
            let bbox = super::helpers::random_bbox(&mut rng, 0.2);
            let cov = covering_for_bbox(&bbox, level).unwrap();
            for _ in 0..50 {
                let p = super::helpers::point_in(&mut rng, &bbox);
                let cell = CellId::from_point(p, level).unwrap();
                assert!(cov.contains(cell), "{p} (cell {cell}) missing from covering of {bbox}");
            }
            // Corners are inside the box too.
            for p in [
                GeoPoint::new(bbox.min_lat, bbox.min_lng),
                GeoPoint::new(bbox.max_lat, bbox.max_lng),
            ] {
                assert!(cov.contains(CellId::from_point(p, level).unwrap()));
            }
        }
    }

    #[test]
    fn bbox_covering_enumerates_what_it_contains() {
        let bbox = BoundingBox::new(37.70, -122.52, 37.83, -122.35).unwrap();
        let cov = covering_for_bbox(&bbox, 13).unwrap();
        let ids = cov.cell_ids();
        assert_eq!(ids.len() as u64, cov.len());
        assert!(ids.iter().all(|c| cov.contains(*c) && c.level() == 13));
        // No cell of the covering lies entirely outside the box.
        assert!(ids.iter().all(|c| c.bounds().intersects(&bbox)));
    }

    #[test]
    fn tiny_bbox_is_one_cell() {
        let p = GeoPoint::new(51.5074, -0.1278);
        let cell = CellId::from_point(p, 15).unwrap();
        let c = cell.center();
        let bbox = BoundingBox::new(c.lat - 1e-5, c.lng - 1e-5, c.lat + 1e-5, c.lng + 1e-5).unwrap();
        let cov = covering_for_bbox(&bbox, 15).unwrap();
        assert_eq!(cov.len(), 1);
        assert!(cov.contains(cell));
    }

    #[test]
    fn covering_rejects_other_levels() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let cov = covering_for_bbox(&bbox, 10).unwrap();
        let fine = CellId::from_point(GeoPoint::new(0.5, 0.5), 11).unwrap();
        assert!(!cov.contains(fine));
    }

    #[test]
    fn radius_covering_is_complete() {
        let mut rng = super::helpers::rng();
        for _ in 0..300 {
            let level = rng.gen_range(10..=16);
            let center = GeoPoint::new(rng.gen_range(-80.0..80.0), rng.gen_range(-180.0..=180.0));
            let radius = rng.gen_range(10.0..5_000.0);
            let cov = covering_for_radius(center, radius, level).unwrap();
            let bbox = BoundingBox::around(center, radius).unwrap();
            let mut checked = 0;
            while checked < 40 {
                let p = super::helpers::point_in(&mut rng, &bbox);
                if center.distance_m(p) > radius {
                    continue;
                }
                checked += 1;
                let cell = CellId::from_point(p, level).unwrap();
                assert!(cov.contains(cell), "{p} within {radius} m of {center} not covered");
            }
        }
    }

    #[test]
    fn radius_covering_across_antimeridian() {
        let center = GeoPoint::new(0.0, 179.999);
        let cov = covering_for_radius(center, 1_000.0, 15).unwrap();
        assert_eq!(cov.rects().len(), 2);
        let across = GeoPoint::new(0.0, -179.9995);
        assert!(center.distance_m(across) < 1_000.0);
        assert!(cov.contains(CellId::from_point(across, 15).unwrap()));
        assert!(cov.contains(CellId::from_point(center, 15).unwrap()));
    }

    #[test]
    fn radius_covering_at_pole_spans_all_longitudes() {
        let cov = covering_for_radius(GeoPoint::new(89.999, 0.0), 2_000.0, 8).unwrap();
        for lng in [-179.0, -90.0, 0.0, 90.0, 179.0] {
            let p = GeoPoint::new(89.9995, lng);
            assert!(cov.contains(CellId::from_point(p, 8).unwrap()), "lng {lng}");
        }
    }

    #[test]
    fn radius_zero_is_the_center_cell() {
        let center = GeoPoint::new(40.7128, -74.0060);
        let cov = covering_for_radius(center, 0.0, 15).unwrap();
        assert_eq!(cov.len(), 1);
        assert!(cov.contains(CellId::from_point(center, 15).unwrap()));
    }

    #[test]
    fn invalid_radius_rejected() {
        let err = covering_for_radius(GeoPoint::new(0.0, 0.0), f64::NAN, 15).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRadius(_)));
    }

    #[test]
    fn index_facade() {
        assert_eq!(CellIndex::new(31), Err(CoreError::InvalidLevel(31)));
        let index = CellIndex::new(15).unwrap();
        let cell = index.cell_id(37.7749, -122.4194).unwrap();
        assert!(index.owns(cell));
        assert!(index.cell_bounds(cell).contains(index.cell_center(cell)));
        let around = index.with_neighbors(cell);
        assert_eq!(around[0], cell);
        assert_eq!(around.len(), 9);
        assert!(matches!(index.cell_id(0.0, 200.0), Err(CoreError::InvalidCoordinate { .. })));
    }
}
