//! Coordinate Reference System handling

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG code of SWEREF 99 TM, the national grid the Baltic bloom maps are produced in
pub const SWEREF99_TM: u32 = 3006;

/// Coordinate Reference System, identified by its EPSG code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CRS {
    epsg: u32,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: code }
    }

    /// Parse an authority string such as `EPSG:3006` or
    /// `urn:ogc:def:crs:EPSG::3006`.
    ///
    /// The OGC CRS84 urn maps to EPSG:4326 (both are lon/lat WGS84).
    pub fn from_authority(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.ends_with("CRS84") {
            return Some(Self::wgs84());
        }
        let upper = s.to_ascii_uppercase();
        let idx = upper.find("EPSG:")?;
        let code = upper[idx + 5..].trim_start_matches(':');
        code.parse().ok().map(Self::from_epsg)
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// SWEREF 99 TM (EPSG:3006)
    pub fn sweref99_tm() -> Self {
        Self::from_epsg(SWEREF99_TM)
    }

    /// EPSG code
    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Whether coordinates are longitude/latitude degrees
    pub fn is_geographic(&self) -> bool {
        self.epsg == 4326
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        self.epsg == other.epsg
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        format!("EPSG:{}", self.epsg)
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::from_epsg(3006);
        assert_eq!(crs.epsg(), 3006);
        assert_eq!(crs.identifier(), "EPSG:3006");
    }

    #[test]
    fn test_crs_equivalence() {
        let a = CRS::from_epsg(4326);
        let b = CRS::wgs84();
        assert!(a.is_equivalent(&b));
        assert!(!a.is_equivalent(&CRS::sweref99_tm()));
    }

    #[test]
    fn test_from_authority() {
        assert_eq!(CRS::from_authority("EPSG:3006"), Some(CRS::sweref99_tm()));
        assert_eq!(
            CRS::from_authority("urn:ogc:def:crs:EPSG::3006"),
            Some(CRS::sweref99_tm())
        );
        assert_eq!(
            CRS::from_authority("urn:ogc:def:crs:OGC:1.3:CRS84"),
            Some(CRS::wgs84())
        );
        assert_eq!(CRS::from_authority("nonsense"), None);
    }
}
