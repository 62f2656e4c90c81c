//! Geometric area of bloom polygons

use baws_core::vector::FeatureCollection;
use baws_core::CRS;
use geo::{Area as GeoArea, GeodesicArea, Geometry};

/// Square metres per square kilometre
pub const M2_PER_KM2: f64 = 1.0e6;

/// How polygon area is measured, chosen from the collection CRS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AreaMetric {
    /// Shoelace area in CRS units squared (m² for projected bloom maps)
    #[default]
    Planar,
    /// Area on the WGS84 ellipsoid in m², for lon/lat coordinates
    Geodesic,
}

impl AreaMetric {
    /// Geodesic for geographic CRSs, planar otherwise (including unknown)
    pub fn for_crs(crs: Option<&CRS>) -> Self {
        match crs {
            Some(crs) if crs.is_geographic() => Self::Geodesic,
            _ => Self::Planar,
        }
    }

    pub fn for_collection(collection: &FeatureCollection) -> Self {
        Self::for_crs(collection.crs.as_ref())
    }

    /// Unsigned area of a geometry in m². Non-areal geometries have no area.
    pub fn area(self, geom: &Geometry<f64>) -> f64 {
        match (self, geom) {
            (Self::Planar, Geometry::Polygon(p)) => p.unsigned_area(),
            (Self::Planar, Geometry::MultiPolygon(mp)) => mp.unsigned_area(),
            (Self::Planar, Geometry::Rect(r)) => r.unsigned_area(),
            (Self::Geodesic, Geometry::Polygon(p)) => p.geodesic_area_unsigned(),
            (Self::Geodesic, Geometry::MultiPolygon(mp)) => mp.geodesic_area_unsigned(),
            (Self::Geodesic, Geometry::Rect(r)) => r.geodesic_area_unsigned(),
            _ => 0.0,
        }
    }

    /// Area of an optional geometry; a missing geometry has zero area
    pub fn feature_area(self, geom: Option<&Geometry<f64>>) -> f64 {
        geom.map(|g| self.area(g)).unwrap_or(0.0)
    }
}

/// Convert square metres to square kilometres rounded to one decimal.
///
/// Ties round to even (`0.25 km²` → `0.2`, `0.35 km²` → `0.4`) so repeated
/// reports on the same data never drift.
pub fn round_km2(area_m2: f64) -> f64 {
    (area_m2 / M2_PER_KM2 * 10.0).round_ties_even() / 10.0
}
