//! # BAWS Core
//!
//! Core types and I/O for curating satellite-derived algal bloom maps.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced single-band grid (daily class codes, weekly day counts)
//! - `GeoTransform` and `CRS`: georeferencing metadata
//! - `Feature` / `FeatureCollection`: bloom polygons carrying a `class` attribute
//! - Collaborator traits and filesystem implementations for GeoTIFF, GeoJSON
//!   and directory listings
//! - A read-only snapshot interface onto the host application's layers

pub mod crs;
pub mod error;
pub mod io;
pub mod layers;
pub mod raster;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use vector::{AttributeValue, Feature, FeatureCollection};

/// Bloom class codes used in daily maps
pub mod class {
    /// Placeholder polygons and empty cells
    pub const DUMMY: i64 = 0;
    pub const CLOUD: i64 = 1;
    pub const SUBSURFACE: i64 = 2;
    pub const SURFACE: i64 = 3;
    pub const NO_DATA: i64 = 4;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::io::{FileLister, GeometrySink, GeometrySource, RasterSink, RasterSource};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::vector::{AttributeValue, Feature, FeatureCollection};
}
