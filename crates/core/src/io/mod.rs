//! I/O for bloom rasters, classified polygon layers and plain-text tables
//!
//! The processing code only talks to the collaborator traits defined here
//! ([`RasterSource`], [`RasterSink`], [`GeometrySource`], [`GeometrySink`],
//! [`FileLister`]); the filesystem-backed implementations are
//! [`GeoTiffIo`], [`GeoJsonIo`] and [`DirectoryLister`].

mod geojson;
mod listing;
mod native;
pub mod text;

pub use geojson::{parse_geojson, read_geojson, to_geojson_string, write_geojson};
pub use listing::{list_files, FileQuery};
pub use native::{
    read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer, Compression,
    GeoTiffOptions,
};

use crate::crs::CRS;
use crate::error::Result;
use crate::raster::Raster;
use crate::vector::{reproject_collection, FeatureCollection};
use std::path::{Path, PathBuf};

/// Opens single-band class-code rasters
pub trait RasterSource {
    fn open(&self, path: &Path) -> Result<Raster<u8>>;
}

/// Persists class-code or count rasters
pub trait RasterSink {
    fn write(&self, raster: &Raster<u8>, path: &Path, options: &GeoTiffOptions) -> Result<()>;
}

/// Loads classified polygon layers
pub trait GeometrySource {
    fn read(&self, path: &Path) -> Result<FeatureCollection>;
}

/// Persists classified polygon layers; encoding and format are fixed by the implementation
pub trait GeometrySink {
    fn write(&self, collection: &FeatureCollection, path: &Path) -> Result<()>;
}

/// Lists files of a directory matching a query, in a stable order
pub trait FileLister {
    fn list(&self, directory: &Path, query: &FileQuery) -> Result<Vec<PathBuf>>;
}

/// GeoTIFF files on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffIo;

impl RasterSource for GeoTiffIo {
    fn open(&self, path: &Path) -> Result<Raster<u8>> {
        read_geotiff(path)
    }
}

impl RasterSink for GeoTiffIo {
    fn write(&self, raster: &Raster<u8>, path: &Path, options: &GeoTiffOptions) -> Result<()> {
        write_geotiff(raster, path, options)
    }
}

/// UTF-8 GeoJSON files on the local filesystem.
///
/// With `export_crs` set, collections are reprojected before writing.
#[derive(Debug, Clone, Default)]
pub struct GeoJsonIo {
    pub export_crs: Option<CRS>,
}

impl GeoJsonIo {
    pub fn exporting_to(crs: CRS) -> Self {
        Self {
            export_crs: Some(crs),
        }
    }
}

impl GeometrySource for GeoJsonIo {
    fn read(&self, path: &Path) -> Result<FeatureCollection> {
        read_geojson(path)
    }
}

impl GeometrySink for GeoJsonIo {
    fn write(&self, collection: &FeatureCollection, path: &Path) -> Result<()> {
        match &self.export_crs {
            Some(target) => write_geojson(&reproject_collection(collection, target)?, path),
            None => write_geojson(collection, path),
        }
    }
}

/// Lists files straight from a local directory, sorted by path
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryLister;

impl FileLister for DirectoryLister {
    fn list(&self, directory: &Path, query: &FileQuery) -> Result<Vec<PathBuf>> {
        list_files(directory, query)
    }
}
