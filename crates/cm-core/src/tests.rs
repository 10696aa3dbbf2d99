//! Unit tests for cm-core primitives.

#[cfg(test)]
mod ids {
    use crate::{OsmNodeId, RelationId, RoadId};

    #[test]
    fn ordering() {
        assert!(RoadId(1) < RoadId(2));
        assert!(OsmNodeId(-5) < OsmNodeId(0));
    }

    #[test]
    fn display_uses_osm_prefix() {
        assert_eq!(RoadId(42).to_string(), "way/42");
        assert_eq!(OsmNodeId(7).to_string(), "node/7");
        assert_eq!(RelationId(9).to_string(), "relation/9");
    }

    #[test]
    fn conversions() {
        let id: RoadId = 123.into();
        assert_eq!(id.get(), 123);
        assert_eq!(i64::from(id), 123);
    }
}

#[cfg(test)]
mod geo {
    use crate::{BoundingBox, CoreError, GeoPoint};

    #[test]
    fn zero_distance() {
        let p = GeoPoint::new(37.7749, -122.4194);
        assert!(p.distance_m(p) < 0.01);
    }

    #[test]
    fn one_degree_latitude() {
        // ~1 degree of latitude ≈ 111 km
        let a = GeoPoint::new(30.0, -88.0);
        let b = GeoPoint::new(31.0, -88.0);
        let d = a.distance_m(b);
        assert!((d - 111_195.0).abs() < 500.0, "got {d}");
    }

    #[test]
    fn try_new_rejects_out_of_range() {
        assert!(GeoPoint::try_new(90.0, 180.0).is_ok());
        assert!(GeoPoint::try_new(-90.0, -180.0).is_ok());
        assert_eq!(
            GeoPoint::try_new(90.5, 0.0),
            Err(CoreError::InvalidCoordinate { lat: 90.5, lng: 0.0 })
        );
        assert!(GeoPoint::try_new(0.0, 180.1).is_err());
        assert!(GeoPoint::try_new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn bbox_normalises_reversed_corners() {
        let b = BoundingBox::new(10.0, 20.0, 5.0, 15.0).unwrap();
        assert_eq!(b, BoundingBox { min_lat: 5.0, min_lng: 15.0, max_lat: 10.0, max_lng: 20.0 });
    }

    #[test]
    fn bbox_contains_edges() {
        let b = BoundingBox::new(0.0, 0.0, 1.0, 1.0).unwrap();
        assert!(b.contains(GeoPoint::new(0.0, 0.0)));
        assert!(b.contains(GeoPoint::new(1.0, 1.0)));
        assert!(!b.contains(GeoPoint::new(1.0001, 0.5)));
    }

    #[test]
    fn around_bounds_the_circle() {
        let center = GeoPoint::new(37.7749, -122.4194);
        let b = BoundingBox::around(center, 1_000.0).unwrap();
        assert!(b.contains(center));
        // Points 999 m due north and due east are inside.
        let north = GeoPoint::new(center.lat + 999.0 / 111_195.0, center.lng);
        assert!(b.contains(north));
        let east_deg = 999.0 / (111_195.0 * center.lat.to_radians().cos());
        assert!(b.contains(GeoPoint::new(center.lat, center.lng + east_deg)));
        // But the box is not absurdly large.
        assert!(b.max_lat - b.min_lat < 0.02);
    }

    #[test]
    fn around_near_pole_spans_all_longitudes() {
        let b = BoundingBox::around(GeoPoint::new(89.99, 10.0), 5_000.0).unwrap();
        assert_eq!(b.min_lng, -180.0);
        assert_eq!(b.max_lng, 180.0);
        assert_eq!(b.max_lat, 90.0);
    }

    #[test]
    fn around_rejects_negative_radius() {
        assert_eq!(
            BoundingBox::around(GeoPoint::new(0.0, 0.0), -1.0),
            Err(CoreError::InvalidRadius(-1.0))
        );
    }
}

#[cfg(test)]
mod config {
    use std::path::{Path, PathBuf};

    use crate::{CoreError, MapConfig, DEFAULT_LEVEL};

    #[test]
    fn default_is_valid() {
        let c = MapConfig::default();
        assert_eq!(c.level, DEFAULT_LEVEL);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn level_above_max_rejected() {
        let c = MapConfig::with_level(31);
        assert_eq!(c.validate(), Err(CoreError::InvalidLevel(31)));
    }

    #[test]
    fn resolve_relative_and_absolute() {
        let c = MapConfig { storage_dir: PathBuf::from("/data/maps"), ..MapConfig::default() };
        assert_eq!(c.resolve(Path::new("a.cms")), PathBuf::from("/data/maps/a.cms"));
        assert_eq!(c.resolve(Path::new("/tmp/b.cms")), PathBuf::from("/tmp/b.cms"));
    }
}
