//! Native GeoTIFF reading/writing (without GDAL dependency)
//!
//! Uses the `tiff` crate for TIFF I/O plus the ModelPixelScale and
//! ModelTiepoint tags for georeferencing. Height rasters follow the
//! pipeline convention: unsigned 16-bit height units with `0` as the nodata
//! sentinel. Float sources are quantized on read with a caller-supplied
//! scale; non-finite and non-positive samples map to nodata.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};
use std::fs::File;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray16, Gray8};
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

// GeoTIFF tag ids
const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;

/// Read a height raster from a GeoTIFF file.
///
/// Integer sources are taken as already quantized height units; float
/// sources are multiplied by `units_per_meter` and rounded.
pub fn read_height_tiff<P: AsRef<Path>>(path: P, units_per_meter: f64) -> Result<Raster<u16>> {
    let file = File::open(path.as_ref())?;
    let mut decoder =
        Decoder::new(file).map_err(|e| Error::Tiff(format!("decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Tiff(format!("cannot read dimensions: {}", e)))?;
    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Tiff(format!("cannot read image data: {}", e)))?;

    let cells: Vec<u16> = match result {
        DecodingResult::U8(buf) => buf.iter().map(|&v| v as u16).collect(),
        DecodingResult::U16(buf) => buf,
        DecodingResult::U32(buf) => buf
            .iter()
            .map(|&v| v.min(u16::MAX as u32) as u16)
            .collect(),
        DecodingResult::F32(buf) => buf
            .iter()
            .map(|&v| quantize_height(v as f64, units_per_meter))
            .collect(),
        DecodingResult::F64(buf) => buf
            .iter()
            .map(|&v| quantize_height(v, units_per_meter))
            .collect(),
        _ => {
            return Err(Error::Tiff(
                "unsupported sample format for a height raster".to_string(),
            ))
        }
    };

    let mut raster = Raster::from_vec(cells, rows, cols)?;
    if let Ok(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }

    Ok(raster)
}

fn quantize_height(value: f64, units_per_meter: f64) -> u16 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    (value * units_per_meter).round().clamp(0.0, u16::MAX as f64) as u16
}

/// Read an 8-bit class or mask raster from a GeoTIFF file
pub fn read_class_tiff<P: AsRef<Path>>(path: P) -> Result<Raster<u8>> {
    let file = File::open(path.as_ref())?;
    let mut decoder =
        Decoder::new(file).map_err(|e| Error::Tiff(format!("decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Tiff(format!("cannot read dimensions: {}", e)))?;
    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Tiff(format!("cannot read image data: {}", e)))?;

    let cells: Vec<u8> = match result {
        DecodingResult::U8(buf) => buf,
        _ => return Err(Error::Tiff("class raster must be 8-bit".to_string())),
    };

    let mut raster = Raster::from_vec(cells, rows, cols)?;
    if let Ok(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }

    Ok(raster)
}

/// Attempt to read a GeoTransform from TIFF tags
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::Unknown(MODEL_PIXEL_SCALE))
        .map_err(|_| Error::Tiff("no pixel scale tag".into()))?;

    let tiepoint = decoder
        .get_tag_f64_vec(Tag::Unknown(MODEL_TIEPOINT))
        .map_err(|_| Error::Tiff("no tiepoint tag".into()))?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z]; scale: [ScaleX, ScaleY, ScaleZ]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
        return Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
    }

    Err(Error::Tiff("cannot determine geotransform".into()))
}

/// Write a height raster as a 16-bit grayscale GeoTIFF
pub fn write_height_tiff<P: AsRef<Path>>(raster: &Raster<u16>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut encoder =
        TiffEncoder::new(file).map_err(|e| Error::Tiff(format!("encoder error: {}", e)))?;

    let (rows, cols) = raster.shape();
    let mut image = encoder
        .new_image::<Gray16>(cols as u32, rows as u32)
        .map_err(|e| Error::Tiff(format!("cannot create image: {}", e)))?;

    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])
        .map_err(|e| Error::Tiff(format!("cannot write scale tag: {}", e)))?;
    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])
        .map_err(|e| Error::Tiff(format!("cannot write tiepoint tag: {}", e)))?;

    let cells: Vec<u16> = raster.data().iter().copied().collect();
    image
        .write_data(&cells)
        .map_err(|e| Error::Tiff(format!("cannot write image data: {}", e)))?;

    Ok(())
}

/// Write a class or mask raster as an 8-bit grayscale GeoTIFF
pub fn write_class_tiff<P: AsRef<Path>>(raster: &Raster<u8>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut encoder =
        TiffEncoder::new(file).map_err(|e| Error::Tiff(format!("encoder error: {}", e)))?;

    let (rows, cols) = raster.shape();
    let mut image = encoder
        .new_image::<Gray8>(cols as u32, rows as u32)
        .map_err(|e| Error::Tiff(format!("cannot create image: {}", e)))?;

    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])
        .map_err(|e| Error::Tiff(format!("cannot write scale tag: {}", e)))?;
    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])
        .map_err(|e| Error::Tiff(format!("cannot write tiepoint tag: {}", e)))?;

    let cells: Vec<u8> = raster.data().iter().copied().collect();
    image
        .write_data(&cells)
        .map_err(|e| Error::Tiff(format!("cannot write image data: {}", e)))?;

    Ok(())
}
