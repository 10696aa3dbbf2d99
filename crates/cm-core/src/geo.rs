//! Geographic coordinate types and spatial utilities.
//!
//! Coordinates are WGS-84 degrees stored as `f64`.  Cell boundaries at level
//! 30 are ~2e-7 degrees apart, well below `f32` resolution.

use crate::{CoreError, CoreResult};

/// Mean Earth radius in metres (spherical model).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// ── GeoPoint ──────────────────────────────────────────────────────────────────

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Construct without validation.  Use [`GeoPoint::try_new`] for input
    /// coming from outside the process.
    #[inline]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Construct a point, rejecting latitudes outside [-90, 90], longitudes
    /// outside [-180, 180] and non-finite values.
    pub fn try_new(lat: f64, lng: f64) -> CoreResult<Self> {
        let p = Self { lat, lng };
        if p.is_valid() {
            Ok(p)
        } else {
            Err(CoreError::InvalidCoordinate { lat, lng })
        }
    }

    /// `true` if both components are finite and within range.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lng * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

// ── Radius helpers ────────────────────────────────────────────────────────────

/// Angular extent of a spherical cap of `radius_m` around `center`, in
/// degrees: `(d_lat, d_lng)`.
///
/// `d_lng` is `None` when the cap reaches a pole, in which case every
/// longitude is inside the cap's bounding rectangle.  `d_lng` may exceed
/// 180; callers wrap or clamp as they need.
pub fn cap_extent_deg(center: GeoPoint, radius_m: f64) -> CoreResult<(f64, Option<f64>)> {
    if !center.is_valid() {
        return Err(CoreError::InvalidCoordinate { lat: center.lat, lng: center.lng });
    }
    if !radius_m.is_finite() || radius_m < 0.0 {
        return Err(CoreError::InvalidRadius(radius_m));
    }

    let angle = radius_m / EARTH_RADIUS_M; // radians
    let d_lat = angle.to_degrees();
    if center.lat + d_lat >= 90.0 || center.lat - d_lat <= -90.0 || angle >= std::f64::consts::FRAC_PI_2 {
        return Ok((d_lat, None));
    }

    // Exact longitude half-width of the cap's bounding rectangle.
    let ratio = angle.sin() / center.lat.to_radians().cos();
    if ratio >= 1.0 {
        return Ok((d_lat, None));
    }
    Ok((d_lat, Some(ratio.asin().to_degrees())))
}

// ── BoundingBox ───────────────────────────────────────────────────────────────

/// An axis-aligned latitude/longitude rectangle, inclusive on all sides.
///
/// Boxes never cross the antimeridian: `min_lng <= max_lng` always holds.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// The whole lat/lng plane.
    pub const WORLD: BoundingBox = BoundingBox {
        min_lat: -90.0,
        min_lng: -180.0,
        max_lat: 90.0,
        max_lng: 180.0,
    };

    /// Build a box from two corners.
    ///
    /// Corners are validated, then normalised so that reversed inputs
    /// describe the same rectangle.
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> CoreResult<Self> {
        let a = GeoPoint::try_new(min_lat, min_lng)?;
        let b = GeoPoint::try_new(max_lat, max_lng)?;
        Ok(Self {
            min_lat: a.lat.min(b.lat),
            min_lng: a.lng.min(b.lng),
            max_lat: a.lat.max(b.lat),
            max_lng: a.lng.max(b.lng),
        })
    }

    /// Bounding box of a circle of `radius_m` around `center`, clamped to the
    /// valid coordinate range.  A circle crossing the antimeridian yields the
    /// full longitude range.
    pub fn around(center: GeoPoint, radius_m: f64) -> CoreResult<Self> {
        let (d_lat, d_lng) = cap_extent_deg(center, radius_m)?;
        let (min_lng, max_lng) = match d_lng {
            Some(d) if center.lng - d >= -180.0 && center.lng + d <= 180.0 => {
                (center.lng - d, center.lng + d)
            }
            _ => (-180.0, 180.0),
        };
        Ok(Self {
            min_lat: (center.lat - d_lat).max(-90.0),
            min_lng,
            max_lat: (center.lat + d_lat).min(90.0),
            max_lng,
        })
    }

    /// `true` if `p` lies inside or on the edge of the box.
    #[inline]
    pub fn contains(&self, p: GeoPoint) -> bool {
        p.lat >= self.min_lat && p.lat <= self.max_lat && p.lng >= self.min_lng && p.lng <= self.max_lng
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new((self.min_lat + self.max_lat) * 0.5, (self.min_lng + self.max_lng) * 0.5)
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[({:.6}, {:.6}) .. ({:.6}, {:.6})]",
            self.min_lat, self.min_lng, self.max_lat, self.max_lng
        )
    }
}
