//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate. Georeferencing is carried by the
//! ModelPixelScale/ModelTiepoint tags, the CRS by the EPSG code in the
//! GeoKeyDirectory, and the no-data value by the GDAL_NODATA ASCII tag.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use num_traits::NumCast;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray8;
use tiff::encoder::compression::{self as tiff_compression, Deflate, Lzw, Uncompressed};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;
const USER_DEFINED: u16 = 32767;

/// Lossless compression applied when writing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Lzw,
    Deflate,
}

impl Compression {
    /// Parse a GDAL-style creation option value (`LZW`, `DEFLATE`, `NONE`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "NONE" => Some(Self::None),
            "LZW" => Some(Self::Lzw),
            "DEFLATE" => Some(Self::Deflate),
            _ => None,
        }
    }
}

/// Options for writing GeoTIFF files
#[derive(Debug, Clone, Default)]
pub struct GeoTiffOptions {
    pub compression: Compression,
}

impl GeoTiffOptions {
    /// Options with LZW compression, used for weekly composites
    pub fn lzw() -> Self {
        Self {
            compression: Compression::Lzw,
        }
    }
}

/// Read the first band of a GeoTIFF file into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(file)
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data))
}

fn tiff_error(context: &str) -> impl Fn(tiff::TiffError) -> Error + '_ {
    move |e| Error::Other(format!("{}: {}", context, e))
}

fn cast_samples<S, T>(buf: &[S]) -> Result<Vec<T>>
where
    S: NumCast + Copy + Display,
    T: RasterElement,
{
    buf.iter()
        .map(|&v| {
            num_traits::cast(v).ok_or_else(|| {
                Error::UnsupportedDataType(format!("sample value {} does not fit the cell type", v))
            })
        })
        .collect()
}

/// Internal: decode a GeoTIFF from any `Read + Seek` source
fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader).map_err(tiff_error("TIFF decode error"))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(tiff_error("Cannot read dimensions"))?;

    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(tiff_error("Cannot read image data"))?;

    let data: Vec<T> = match result {
        DecodingResult::U8(buf) => cast_samples(&buf)?,
        DecodingResult::U16(buf) => cast_samples(&buf)?,
        DecodingResult::U32(buf) => cast_samples(&buf)?,
        DecodingResult::I8(buf) => cast_samples(&buf)?,
        DecodingResult::I16(buf) => cast_samples(&buf)?,
        DecodingResult::I32(buf) => cast_samples(&buf)?,
        DecodingResult::F32(buf) => cast_samples(&buf)?,
        DecodingResult::F64(buf) => cast_samples(&buf)?,
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    // Multi-band files decode interleaved; only single-band grids are valid
    if data.len() != rows * cols {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_crs(read_crs(&mut decoder));
    raster.set_nodata(read_nodata(&mut decoder));

    Ok(raster)
}

/// Read GeoTransform from ModelPixelScaleTag + ModelTiepointTag
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];

    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

/// Read the EPSG code from the GeoKeyDirectory, if one is declared inline
fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag).ok()?;
    if keys.len() < 4 {
        return None;
    }

    let count = keys[3] as usize;
    keys[4..]
        .chunks_exact(4)
        .take(count)
        .filter(|entry| entry[1] == 0 && entry[2] == 1)
        .find(|entry| entry[0] == PROJECTED_CS_TYPE_KEY || entry[0] == GEOGRAPHIC_TYPE_KEY)
        .map(|entry| entry[3])
        .filter(|&code| code != USER_DEFINED)
        .map(|code| CRS::from_epsg(code as u32))
}

fn read_nodata<T: RasterElement, R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<T> {
    let text = decoder.get_tag_ascii_string(Tag::GdalNodata).ok()?;
    let value: f64 = text.trim_end_matches('\0').trim().parse().ok()?;
    num_traits::cast(value)
}

/// Write a class-code or count raster to a GeoTIFF file
pub fn write_geotiff<P: AsRef<Path>>(
    raster: &Raster<u8>,
    path: P,
    options: &GeoTiffOptions,
) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode_geotiff(raster, &mut writer, options)?;
    writer.flush()?;
    Ok(())
}

/// Write a raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer(raster: &Raster<u8>, options: &GeoTiffOptions) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf), options)?;
    Ok(buf)
}

/// Internal: encode a raster as 8-bit GeoTIFF into any `Write + Seek` sink
fn encode_geotiff<W: Write + Seek>(
    raster: &Raster<u8>,
    writer: W,
    options: &GeoTiffOptions,
) -> Result<()> {
    let mut encoder = TiffEncoder::new(writer).map_err(tiff_error("TIFF encoder error"))?;

    match options.compression {
        Compression::None => write_image(&mut encoder, raster, Uncompressed),
        Compression::Lzw => write_image(&mut encoder, raster, Lzw),
        Compression::Deflate => write_image(&mut encoder, raster, Deflate::default()),
    }
}

fn write_image<W, D>(
    encoder: &mut TiffEncoder<W>,
    raster: &Raster<u8>,
    compression: D,
) -> Result<()>
where
    W: Write + Seek,
    D: tiff_compression::Compression,
{
    let (rows, cols) = raster.shape();
    let data: Vec<u8> = raster.data().iter().copied().collect();

    let mut image = encoder
        .new_image_with_compression::<Gray8, D>(cols as u32, rows as u32, compression)
        .map_err(tiff_error("Cannot create TIFF image"))?;

    let gt = raster.transform();

    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &scale[..])
        .map_err(tiff_error("Cannot write scale tag"))?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
        .map_err(tiff_error("Cannot write tiepoint tag"))?;

    let geokeys = geo_key_directory(raster.crs());
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, &geokeys[..])
        .map_err(tiff_error("Cannot write geokey tag"))?;

    if let Some(nodata) = raster.nodata() {
        let text = nodata.to_string();
        image
            .encoder()
            .write_tag(Tag::GdalNodata, text.as_str())
            .map_err(tiff_error("Cannot write nodata tag"))?;
    }

    image
        .write_data(&data)
        .map_err(tiff_error("Cannot write image data"))?;

    Ok(())
}

/// GeoKeyDirectory entries, sorted by key id as the GeoTIFF spec requires
fn geo_key_directory(crs: Option<&CRS>) -> Vec<u16> {
    let epsg = crs.and_then(|c| u16::try_from(c.epsg()).ok());
    let geographic = crs.map(CRS::is_geographic).unwrap_or(false);

    // ModelTypeProjected = 1, ModelTypeGeographic = 2; RasterPixelIsArea = 1
    let model_type = if geographic { 2 } else { 1 };
    let mut entries = vec![
        [GT_MODEL_TYPE_KEY, 0, 1, model_type],
        [GT_RASTER_TYPE_KEY, 0, 1, 1],
    ];
    if let Some(code) = epsg {
        let key = if geographic {
            GEOGRAPHIC_TYPE_KEY
        } else {
            PROJECTED_CS_TYPE_KEY
        };
        entries.push([key, 0, 1, code]);
    }

    let mut out = vec![1, 1, 0, entries.len() as u16];
    out.extend(entries.iter().flatten());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_grid() -> Raster<u8> {
        let mut raster = Raster::from_vec(vec![0, 1, 2, 3, 4, 2], 2, 3).unwrap();
        raster.set_transform(GeoTransform::new(250_000.0, 6_800_000.0, 1000.0, -1000.0));
        raster.set_crs(Some(CRS::sweref99_tm()));
        raster
    }

    #[test]
    fn test_buffer_roundtrip_lzw() {
        let raster = class_grid();
        let buf = write_geotiff_to_buffer(&raster, &GeoTiffOptions::lzw()).unwrap();
        let back: Raster<u8> = read_geotiff_from_buffer(&buf).unwrap();

        assert_eq!(back.data(), raster.data());
        assert_eq!(back.transform(), raster.transform());
        assert_eq!(back.crs(), Some(&CRS::sweref99_tm()));
        assert_eq!(back.nodata(), None);
    }

    #[test]
    fn test_nodata_and_geographic_crs() {
        let mut raster = class_grid();
        raster.set_crs(Some(CRS::wgs84()));
        raster.set_nodata(Some(4));
        let buf = write_geotiff_to_buffer(&raster, &GeoTiffOptions::default()).unwrap();
        let back: Raster<u8> = read_geotiff_from_buffer(&buf).unwrap();

        assert_eq!(back.crs(), Some(&CRS::wgs84()));
        assert_eq!(back.nodata(), Some(4));
    }

    #[test]
    fn test_file_roundtrip_keeps_georeferencing() {
        let dir = tempfile::tempdir().unwrap();
        for (name, options) in [
            ("plain.tif", GeoTiffOptions::default()),
            ("lzw.tif", GeoTiffOptions::lzw()),
        ] {
            let path = dir.path().join(name);
            write_geotiff(&class_grid(), &path, &options).unwrap();
            let back: Raster<u8> = read_geotiff(&path).unwrap();

            assert_eq!(back.data(), class_grid().data());
            assert_eq!(back.transform().origin_x, 250_000.0);
            assert_eq!(back.transform().origin_y, 6_800_000.0);
            assert_eq!(back.transform().pixel_height, -1000.0);
            assert_eq!(back.crs().map(CRS::epsg), Some(3006));
        }
    }

    #[test]
    fn test_compression_names() {
        assert_eq!(Compression::from_name("lzw"), Some(Compression::Lzw));
        assert_eq!(Compression::from_name("DEFLATE"), Some(Compression::Deflate));
        assert_eq!(Compression::from_name("jpeg"), None);
    }

    #[test]
    fn test_geo_key_directory_layout() {
        let keys = geo_key_directory(Some(&CRS::sweref99_tm()));
        assert_eq!(&keys[..4], &[1, 1, 0, 3]);
        assert_eq!(&keys[12..], &[PROJECTED_CS_TYPE_KEY, 0, 1, 3006]);

        let bare = geo_key_directory(None);
        assert_eq!(bare[3], 2);
    }
}
