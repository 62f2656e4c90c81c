//! Weekly bloom-day composite
//!
//! Each daily class map is reduced to a bloom indicator (1 where the cell is
//! subsurface or surface bloom, 0 elsewhere) and the indicators are summed
//! cell by cell. The result counts, per cell, the days of the window with
//! bloom.

use std::path::{Path, PathBuf};

use baws_core::class;
use baws_core::io::{Compression, GeoTiffOptions, RasterSink, RasterSource};
use baws_core::raster::Raster;
use baws_core::{Error, Result};
use ndarray::{Array2, Zip};
use tracing::{debug, info};

/// Most daily grids a composite can count without overflowing `u8`
pub const MAX_COMPOSITE_DAYS: usize = u8::MAX as usize;

/// Parameters for weekly compositing
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeParams {
    /// Class codes counted as a bloom day
    pub bloom_classes: Vec<u8>,
    /// Marker in daily file names
    pub day_marker: String,
    /// Replacement for `day_marker` in the output name
    pub week_marker: String,
    /// Compression of the written composite
    pub compression: Compression,
}

impl Default for CompositeParams {
    fn default() -> Self {
        Self {
            bloom_classes: vec![class::SUBSURFACE as u8, class::SURFACE as u8],
            day_marker: "_daymap_".to_string(),
            week_marker: "_weekmap_".to_string(),
            compression: Compression::Lzw,
        }
    }
}

/// 1 where the cell holds one of `bloom_classes`, else 0
pub fn bloom_indicator(grid: &Raster<u8>, bloom_classes: &[u8]) -> Array2<u8> {
    grid.data().mapv(|code| u8::from(bloom_classes.contains(&code)))
}

/// Per-cell bloom-day counter.
///
/// The first grid fixes the shape and the georeferencing of the result;
/// every later grid must have the same shape.
#[derive(Debug)]
pub struct BloomDayAccumulator {
    bloom_classes: Vec<u8>,
    /// First grid added, source of the result's transform and CRS
    template: Option<Raster<u8>>,
    counts: Option<Array2<u16>>,
    days: usize,
}

impl BloomDayAccumulator {
    pub fn new(bloom_classes: &[u8]) -> Self {
        Self {
            bloom_classes: bloom_classes.to_vec(),
            template: None,
            counts: None,
            days: 0,
        }
    }

    /// Number of grids added so far
    pub fn days(&self) -> usize {
        self.days
    }

    /// Add one daily grid; `source` names it in errors
    pub fn add(&mut self, source: &Path, grid: &Raster<u8>) -> Result<()> {
        if self.days >= MAX_COMPOSITE_DAYS {
            return Err(Error::InvalidParameter {
                name: "days",
                value: (self.days + 1).to_string(),
                reason: format!("a composite holds at most {} daily grids", MAX_COMPOSITE_DAYS),
            });
        }

        if let Some(template) = &self.template {
            let (er, ec) = template.shape();
            let (ar, ac) = grid.shape();
            if (er, ec) != (ar, ac) {
                return Err(Error::GridShapeMismatch {
                    path: source.to_path_buf(),
                    er,
                    ec,
                    ar,
                    ac,
                });
            }
        } else {
            self.template = Some(grid.clone());
        }
        let counts = self.counts.get_or_insert_with(|| Array2::zeros(grid.shape()));

        let indicator = bloom_indicator(grid, &self.bloom_classes);
        Zip::from(counts)
            .and(&indicator)
            .for_each(|count, &day| *count += u16::from(day));
        self.days += 1;
        Ok(())
    }

    /// The count raster on the first grid's georeferencing, or `None` if no
    /// grid was added
    pub fn finish(self) -> Result<Option<Raster<u8>>> {
        let (Some(template), Some(counts)) = (self.template, self.counts) else {
            return Ok(None);
        };
        // counts <= days <= 255
        let data = counts.mapv(|c| c.min(u16::from(u8::MAX)) as u8);
        template.with_same_meta(data).map(Some)
    }
}

/// A finished composite, ready to be written
#[derive(Debug, Clone)]
pub struct WeeklyComposite {
    pub raster: Raster<u8>,
    pub output_path: PathBuf,
    /// Daily files in the order they were added
    pub sources: Vec<PathBuf>,
    pub options: GeoTiffOptions,
}

impl WeeklyComposite {
    pub fn days(&self) -> usize {
        self.sources.len()
    }

    /// Write the composite to [`Self::output_path`]
    pub fn write<S: RasterSink + ?Sized>(&self, sink: &S) -> Result<()> {
        info!("Writing weekly composite to {}", self.output_path.display());
        sink.write(&self.raster, &self.output_path, &self.options)
    }
}

/// Name of the weekly composite derived from the last daily file.
///
/// `day_marker` is replaced by `week_marker` in the file name; the directory
/// is kept. A name without the marker is an error so a daily map is never
/// overwritten.
pub fn weekly_output_path(
    last_daily: &Path,
    day_marker: &str,
    week_marker: &str,
) -> Result<PathBuf> {
    let name = last_daily
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !day_marker.is_empty() && n.contains(day_marker))
        .ok_or_else(|| Error::Naming {
            path: last_daily.to_path_buf(),
            marker: day_marker.to_string(),
        })?;
    Ok(last_daily.with_file_name(name.replace(day_marker, week_marker)))
}

/// Builds weekly composites from daily class maps
pub struct RasterCompositor<'a, S: RasterSource + ?Sized> {
    source: &'a S,
    params: CompositeParams,
}

impl<'a, S: RasterSource + ?Sized> RasterCompositor<'a, S> {
    pub fn new(source: &'a S, params: CompositeParams) -> Self {
        Self { source, params }
    }

    pub fn params(&self) -> &CompositeParams {
        &self.params
    }

    /// Composite `files` in the given order.
    ///
    /// Returns `Ok(None)` for an empty file list. Any read failure or shape
    /// mismatch aborts the whole composite.
    pub fn composite(&self, files: &[PathBuf]) -> Result<Option<WeeklyComposite>> {
        let Some(last) = files.last() else {
            info!("No daily maps selected, composite not created");
            return Ok(None);
        };
        let output_path =
            weekly_output_path(last, &self.params.day_marker, &self.params.week_marker)?;

        info!("Creating composite from {} daily map(s)", files.len());
        let mut acc = BloomDayAccumulator::new(&self.params.bloom_classes);
        for path in files {
            info!("Adding {} to composite", display_name(path));
            let grid = self.source.open(path)?;
            acc.add(path, &grid)?;
        }
        debug!("Accumulated {} day(s)", acc.days());

        let Some(raster) = acc.finish()? else {
            return Ok(None);
        };
        Ok(Some(WeeklyComposite {
            raster,
            output_path,
            sources: files.to_vec(),
            options: GeoTiffOptions {
                compression: self.params.compression,
            },
        }))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use baws_core::raster::GeoTransform;
    use baws_core::CRS;
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn grid(values: [[u8; 3]; 3]) -> Raster<u8> {
        let flat: Vec<u8> = values.iter().flatten().copied().collect();
        let mut r = Raster::from_vec(flat, 3, 3).unwrap();
        r.set_transform(GeoTransform::new(500_000.0, 6_500_000.0, 300.0, -300.0));
        r.set_crs(Some(CRS::sweref99_tm()));
        r
    }

    struct MemorySource(HashMap<PathBuf, Raster<u8>>);

    impl RasterSource for MemorySource {
        fn open(&self, path: &Path) -> Result<Raster<u8>> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| Error::Other(format!("no such raster: {}", path.display())))
        }
    }

    #[derive(Default)]
    struct MemorySink(RefCell<Vec<PathBuf>>);

    impl RasterSink for MemorySink {
        fn write(&self, _raster: &Raster<u8>, path: &Path, options: &GeoTiffOptions) -> Result<()> {
            assert_eq!(options.compression, Compression::Lzw);
            self.0.borrow_mut().push(path.to_path_buf());
            Ok(())
        }
    }

    fn two_days() -> (MemorySource, Vec<PathBuf>) {
        let a = PathBuf::from("/maps/cyano_daymap_20190701.tiff");
        let b = PathBuf::from("/maps/cyano_daymap_20190702.tiff");
        let source = MemorySource(HashMap::from([
            (a.clone(), grid([[2, 0, 1], [3, 3, 0], [0, 0, 2]])),
            (b.clone(), grid([[0, 0, 1], [3, 2, 0], [0, 0, 0]])),
        ]));
        (source, vec![a, b])
    }

    #[test]
    fn test_bloom_indicator() {
        let ind = bloom_indicator(&grid([[0, 1, 2], [3, 4, 2], [1, 1, 1]]), &[2, 3]);
        assert_eq!(ind, ndarray::arr2(&[[0, 0, 1], [1, 0, 1], [0, 0, 0]]));
    }

    #[test]
    fn test_two_day_composite() {
        let (source, files) = two_days();
        let comp = RasterCompositor::new(&source, CompositeParams::default())
            .composite(&files)
            .unwrap()
            .unwrap();

        assert_eq!(comp.raster.data(), &ndarray::arr2(&[[1, 0, 0], [2, 2, 0], [0, 0, 1]]));
        assert_eq!(comp.output_path, PathBuf::from("/maps/cyano_weekmap_20190702.tiff"));
        assert_eq!(comp.days(), 2);
        assert_eq!(comp.raster.transform().origin_x, 500_000.0);
        assert_eq!(comp.raster.crs().map(CRS::epsg), Some(3006));

        let sink = MemorySink::default();
        comp.write(&sink).unwrap();
        assert_eq!(sink.0.borrow().as_slice(), &[comp.output_path.clone()]);
    }

    #[test]
    fn test_order_does_not_change_counts() {
        let (source, mut files) = two_days();
        let compositor = RasterCompositor::new(&source, CompositeParams::default());
        let forward = compositor.composite(&files).unwrap().unwrap();
        files.reverse();
        let backward = compositor.composite(&files).unwrap().unwrap();
        assert_eq!(forward.raster.data(), backward.raster.data());
    }

    #[test]
    fn test_empty_selection() {
        let source = MemorySource(HashMap::new());
        let compositor = RasterCompositor::new(&source, CompositeParams::default());
        assert!(compositor.composite(&[]).unwrap().is_none());
    }

    #[test]
    fn test_shape_mismatch_is_fatal() {
        let mut acc = BloomDayAccumulator::new(&[2, 3]);
        acc.add(Path::new("a"), &grid([[2; 3]; 3])).unwrap();
        let wide = Raster::from_vec(vec![2u8; 8], 2, 4).unwrap();
        let err = acc.add(Path::new("b"), &wide).unwrap_err();
        assert!(matches!(err, Error::GridShapeMismatch { ar: 2, ac: 4, .. }));
    }

    #[test]
    fn test_missing_file_propagates() {
        let (source, mut files) = two_days();
        files.insert(1, PathBuf::from("/maps/cyano_daymap_20190630.tiff"));
        let compositor = RasterCompositor::new(&source, CompositeParams::default());
        assert!(matches!(compositor.composite(&files), Err(Error::Other(_))));
    }

    #[test]
    fn test_weekly_output_path() {
        let daily = Path::new("/prod/cyano_daymap_20190702.tiff");
        let p = weekly_output_path(daily, "_daymap_", "_weekmap_").unwrap();
        assert_eq!(p, PathBuf::from("/prod/cyano_weekmap_20190702.tiff"));

        let unmarked = Path::new("/prod/cyano_20190702.tiff");
        let err = weekly_output_path(unmarked, "_daymap_", "_weekmap_");
        assert!(matches!(err, Err(Error::Naming { .. })));
    }

    #[test]
    fn test_counts_bounded_by_days() {
        let mut acc = BloomDayAccumulator::new(&[2, 3]);
        for _ in 0..5 {
            acc.add(Path::new("d"), &grid([[2, 3, 0], [1, 4, 2], [3, 3, 3]])).unwrap();
        }
        let raster = acc.finish().unwrap().unwrap();
        assert!(raster.data().iter().all(|&c| c <= 5));
        assert_eq!(raster.get(0, 0).unwrap(), 5);
        assert_eq!(raster.get(0, 2).unwrap(), 0);
    }

    #[test]
    fn test_finish_takes_first_grid_georeferencing() {
        let mut shifted = grid([[2; 3]; 3]);
        shifted.set_transform(GeoTransform::new(0.0, 0.0, 1.0, -1.0));
        shifted.set_crs(None);

        let mut acc = BloomDayAccumulator::new(&[2, 3]);
        acc.add(Path::new("d1"), &grid([[0; 3]; 3])).unwrap();
        acc.add(Path::new("d2"), &shifted).unwrap();
        let raster = acc.finish().unwrap().unwrap();

        assert_eq!(raster.transform(), grid([[0; 3]; 3]).transform());
        assert_eq!(raster.crs(), Some(&CRS::sweref99_tm()));
        assert_eq!(raster.nodata(), None);
        assert!(BloomDayAccumulator::new(&[2, 3]).finish().unwrap().is_none());
    }
}
