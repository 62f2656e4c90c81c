//! Pure-Rust transverse Mercator reprojection (Snyder 1987, USGS formulas).
//!
//! Covers EPSG 326xx (UTM North), 327xx (UTM South) and 3006 (SWEREF 99 TM),
//! which are the grids bloom maps are delivered in, plus geographic WGS84
//! (EPSG 4326). SWEREF 99 uses the GRS80 ellipsoid; its flattening differs
//! from WGS84 by about 1e-10, well below map precision, so both share the
//! WGS84 constants.

use crate::crs::{CRS, SWEREF99_TM};
use crate::error::{Error, Result};
use crate::vector::FeatureCollection;
use geo::MapCoords;
use geo_types::{Coord, Geometry};

// ── WGS84 ellipsoid constants ────────────────────────────────────────────

const A: f64 = 6_378_137.0; // semi-major axis (m)
const F: f64 = 1.0 / 298.257_223_563; // flattening
const E2: f64 = 2.0 * F - F * F; // eccentricity squared
const E_PRIME2: f64 = E2 / (1.0 - E2); // second eccentricity squared
const UTM_K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Parameters of a transverse Mercator grid on the WGS84 ellipsoid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    /// Central meridian in degrees
    pub lon0: f64,
    /// Scale factor on the central meridian
    pub k0: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

impl TransverseMercator {
    /// Projection parameters for a supported projected EPSG code
    pub fn for_epsg(epsg: u32) -> Option<Self> {
        let utm = |zone: u32, false_northing: f64| Self {
            lon0: (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0,
            k0: UTM_K0,
            false_easting: FALSE_EASTING,
            false_northing,
        };
        match epsg {
            SWEREF99_TM => Some(Self {
                lon0: 15.0,
                k0: UTM_K0,
                false_easting: FALSE_EASTING,
                false_northing: 0.0,
            }),
            32601..=32660 => Some(utm(epsg - 32600, 0.0)),
            32701..=32760 => Some(utm(epsg - 32700, FALSE_NORTHING_SOUTH)),
            _ => None,
        }
    }

    /// WGS84 (longitude, latitude) in degrees to (easting, northing) in metres
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let lat = lat_deg.to_radians();
        let lon = lon_deg.to_radians();
        let lon0 = self.lon0.to_radians();

        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let tan_lat = lat.tan();

        let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
        let t = tan_lat * tan_lat;
        let c = E_PRIME2 * cos_lat * cos_lat;
        let a_coeff = cos_lat * (lon - lon0);
        let m = meridional_arc(lat);

        let a2 = a_coeff * a_coeff;
        let a4 = a2 * a2;
        let a6 = a4 * a2;

        // Snyder eq. 8-9
        let easting = self.k0
            * n
            * (a_coeff
                + (1.0 - t + c) * a2 * a_coeff / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * E_PRIME2) * a4 * a_coeff / 120.0)
            + self.false_easting;

        // Snyder eq. 8-10
        let northing = self.k0
            * (m + n
                * tan_lat
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * E_PRIME2) * a6 / 720.0))
            + self.false_northing;

        (easting, northing)
    }

    /// (easting, northing) in metres to WGS84 (longitude, latitude) in degrees
    pub fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let x = easting - self.false_easting;
        let y = northing - self.false_northing;

        // Footpoint latitude, Snyder eq. 7-19 and 3-26
        let m = y / self.k0;
        let e4 = E2 * E2;
        let e6 = e4 * E2;
        let mu = m / (A * (1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
        let sqrt_1_e2 = (1.0 - E2).sqrt();
        let e1 = (1.0 - sqrt_1_e2) / (1.0 + sqrt_1_e2);
        let e1_2 = e1 * e1;
        let e1_3 = e1_2 * e1;
        let e1_4 = e1_3 * e1;
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

        let sin1 = phi1.sin();
        let cos1 = phi1.cos();
        let tan1 = phi1.tan();
        let c1 = E_PRIME2 * cos1 * cos1;
        let t1 = tan1 * tan1;
        let w = 1.0 - E2 * sin1 * sin1;
        let n1 = A / w.sqrt();
        let r1 = A * (1.0 - E2) / (w * w.sqrt());
        let d = x / (n1 * self.k0);

        let d2 = d * d;
        let d3 = d2 * d;
        let d4 = d3 * d;
        let d5 = d4 * d;
        let d6 = d5 * d;

        // Snyder eq. 8-17 and 8-18
        let lat = phi1
            - (n1 * tan1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * E_PRIME2) * d4 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * E_PRIME2
                        - 3.0 * c1 * c1)
                        * d6
                        / 720.0);
        let lon = self.lon0.to_radians()
            + (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * E_PRIME2 + 24.0 * t1 * t1)
                    * d5
                    / 120.0)
                / cos1;

        (lon.to_degrees(), lat.to_degrees())
    }
}

/// Meridional arc from equator to latitude `lat` (radians), Snyder eq. 3-21.
fn meridional_arc(lat: f64) -> f64 {
    let e4 = E2 * E2;
    let e6 = e4 * E2;

    A * ((1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * E2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

/// How to get from one CRS to another
enum Transform {
    Identity,
    Forward(TransverseMercator),
    Inverse(TransverseMercator),
    Chain(TransverseMercator, TransverseMercator),
}

fn resolve(from: &CRS, to: &CRS) -> Result<Transform> {
    if from.is_equivalent(to) {
        return Ok(Transform::Identity);
    }
    let unsupported = || Error::UnsupportedCrs {
        from: from.identifier(),
        to: to.identifier(),
    };
    let projection = |crs: &CRS| TransverseMercator::for_epsg(crs.epsg());

    match (from.is_geographic(), to.is_geographic()) {
        (true, false) => projection(to).map(Transform::Forward).ok_or_else(unsupported),
        (false, true) => projection(from).map(Transform::Inverse).ok_or_else(unsupported),
        (false, false) => match (projection(from), projection(to)) {
            (Some(a), Some(b)) => Ok(Transform::Chain(a, b)),
            _ => Err(unsupported()),
        },
        (true, true) => Ok(Transform::Identity),
    }
}

fn apply(transform: &Transform, c: Coord<f64>) -> Coord<f64> {
    let (x, y) = match transform {
        Transform::Identity => (c.x, c.y),
        Transform::Forward(tm) => tm.forward(c.x, c.y),
        Transform::Inverse(tm) => tm.inverse(c.x, c.y),
        Transform::Chain(a, b) => {
            let (lon, lat) = a.inverse(c.x, c.y);
            b.forward(lon, lat)
        }
    };
    Coord { x, y }
}

/// Reproject a single geometry between two supported CRS
pub fn reproject_geometry(geom: &Geometry<f64>, from: &CRS, to: &CRS) -> Result<Geometry<f64>> {
    let transform = resolve(from, to)?;
    Ok(geom.map_coords(|c| apply(&transform, c)))
}

/// Reproject every geometry of a collection to `target`.
///
/// A collection without a CRS cannot be reprojected and is rejected.
pub fn reproject_collection(
    collection: &FeatureCollection,
    target: &CRS,
) -> Result<FeatureCollection> {
    let source = collection.crs.as_ref().ok_or_else(|| Error::UnsupportedCrs {
        from: "Unknown".to_string(),
        to: target.identifier(),
    })?;
    let transform = resolve(source, target)?;

    let mut out = collection.clone();
    for feature in &mut out.features {
        if let Some(geom) = feature.geometry.as_ref() {
            feature.geometry = Some(geom.map_coords(|c| apply(&transform, c)));
        }
    }
    out.crs = Some(target.clone());
    Ok(out)
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Feature;
    use approx::assert_relative_eq;
    use geo_types::{polygon, Geometry};

    #[test]
    fn parse_supported_codes() {
        assert_eq!(TransverseMercator::for_epsg(32633).map(|t| t.lon0), Some(15.0));
        assert_eq!(TransverseMercator::for_epsg(3006).map(|t| t.lon0), Some(15.0));
        assert_eq!(
            TransverseMercator::for_epsg(32721).map(|t| t.false_northing),
            Some(FALSE_NORTHING_SOUTH)
        );
        assert!(TransverseMercator::for_epsg(3857).is_none());
        assert!(TransverseMercator::for_epsg(32600).is_none());
    }

    #[test]
    fn central_meridian_maps_to_false_easting() {
        let tm = TransverseMercator::for_epsg(SWEREF99_TM).unwrap();
        let (e, _) = tm.forward(15.0, 58.0);
        assert_relative_eq!(e, 500_000.0, epsilon = 1e-6);
    }

    #[test]
    fn forward_inverse_roundtrip_baltic() {
        let tm = TransverseMercator::for_epsg(SWEREF99_TM).unwrap();
        for &(lon, lat) in &[(18.07, 59.33), (12.0, 55.5), (18.5, 63.8), (15.0, 57.0)] {
            let (e, n) = tm.forward(lon, lat);
            let (lon2, lat2) = tm.inverse(e, n);
            assert_relative_eq!(lon2, lon, epsilon = 1e-6);
            assert_relative_eq!(lat2, lat, epsilon = 1e-6);
        }
    }

    #[test]
    fn roundtrip_southern_utm() {
        let tm = TransverseMercator::for_epsg(32719).unwrap();
        let (e, n) = tm.forward(-70.6, -33.4);
        assert!(n > 6_000_000.0 && n < FALSE_NORTHING_SOUTH);
        let (lon, lat) = tm.inverse(e, n);
        assert_relative_eq!(lon, -70.6, epsilon = 1e-6);
        assert_relative_eq!(lat, -33.4, epsilon = 1e-6);
    }

    #[test]
    fn reproject_collection_to_wgs84() {
        let square: Geometry<f64> = Geometry::Polygon(polygon![
            (x: 500_000.0, y: 6_500_000.0),
            (x: 501_000.0, y: 6_500_000.0),
            (x: 501_000.0, y: 6_501_000.0),
            (x: 500_000.0, y: 6_500_000.0),
        ]);
        let mut collection = FeatureCollection::with_crs(CRS::sweref99_tm());
        collection.push(Feature::classified(square, 2));
        collection.push(Feature::empty());

        let out = reproject_collection(&collection, &CRS::wgs84()).unwrap();
        assert_eq!(out.crs, Some(CRS::wgs84()));
        assert!(out.features[1].geometry.is_none());
        match out.features[0].geometry.as_ref().unwrap() {
            Geometry::Polygon(p) => {
                let first = p.exterior().0[0];
                assert_relative_eq!(first.x, 15.0, epsilon = 1e-9);
                assert!(first.y > 58.0 && first.y < 59.0);
            }
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn reproject_without_crs_fails() {
        let collection = FeatureCollection::new();
        assert!(matches!(
            reproject_collection(&collection, &CRS::wgs84()),
            Err(Error::UnsupportedCrs { .. })
        ));
    }

    #[test]
    fn unsupported_pair_is_an_error() {
        let pt = Geometry::Point(geo_types::point!(x: 0.0, y: 0.0));
        let result = reproject_geometry(&pt, &CRS::from_epsg(3857), &CRS::wgs84());
        assert!(matches!(result, Err(Error::UnsupportedCrs { .. })));
    }
}
