//! Cell value trait for class-code and count rasters

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a raster cell.
///
/// Daily bloom maps hold class codes and weekly composites hold day counts,
/// both written as 8-bit GeoTIFFs.
pub trait RasterElement:
    Copy + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;
}

impl RasterElement for u8 {
    fn is_nodata(&self, nodata: Option<Self>) -> bool {
        nodata == Some(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_code_nodata() {
        assert!(4u8.is_nodata(Some(4)));
        assert!(!3u8.is_nodata(Some(4)));
        assert!(!0u8.is_nodata(None));
    }
}
