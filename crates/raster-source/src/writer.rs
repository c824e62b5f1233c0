//! GeoTIFF writer for derived rasters (reprojection output).
//!
//! Writes chunky (pixel-interleaved), uncompressed strips with the
//! ModelPixelScale, ModelTiepoint and GeoKeyDirectory tags. Any band count
//! and any [`BandSamples`] type is accepted.

use std::io::{Cursor, Seek, Write};

use planner_common::Crs;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

use crate::error::{RasterError, Result};
use crate::geo::{geokeys_for, GeoTransform};
use crate::samples::{BandSamples, SampleType};

/// Target size of one strip in bytes.
const STRIP_BYTES: usize = 256 * 1024;

/// A complete in-memory raster ready to be written.
#[derive(Debug, Clone)]
pub struct RasterData {
    pub width: u32,
    pub height: u32,
    pub crs: Crs,
    /// Whether `crs` is geographic (lon/lat); selects the GeoKey layout.
    pub geographic: bool,
    pub transform: GeoTransform,
    /// Band-sequential samples, all of the same type.
    pub bands: Vec<BandSamples>,
}

impl RasterData {
    fn sample_type(&self) -> Result<SampleType> {
        let first = self
            .bands
            .first()
            .ok_or_else(|| RasterError::Write("raster has no bands".into()))?;
        let sample_type = band_sample_type(first);
        let pixels = self.width as usize * self.height as usize;
        for band in &self.bands {
            if band_sample_type(band) != sample_type {
                return Err(RasterError::Write("bands have mixed sample types".into()));
            }
            if band.len() != pixels {
                return Err(RasterError::Write(format!(
                    "band has {} samples, expected {}",
                    band.len(),
                    pixels
                )));
            }
        }
        Ok(sample_type)
    }

    /// Encode to GeoTIFF bytes.
    pub fn to_geotiff_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_geotiff(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Encode to any seekable writer.
    pub fn write_geotiff<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let sample_type = self.sample_type()?;
        let bands = self.bands.len();
        let bytes_per_row = self.width as usize * bands * (sample_type.bits() as usize / 8);
        let rows_per_strip = (STRIP_BYTES / bytes_per_row.max(1)).clamp(1, self.height.max(1) as usize);

        let mut encoder = TiffEncoder::new(writer).map_err(write_err)?;
        let mut dir = encoder.image_directory().map_err(write_err)?;

        dir.write_tag(Tag::ImageWidth, self.width).map_err(write_err)?;
        dir.write_tag(Tag::ImageLength, self.height).map_err(write_err)?;
        let bits = vec![sample_type.bits(); bands];
        dir.write_tag(Tag::BitsPerSample, bits.as_slice()).map_err(write_err)?;
        let formats = vec![sample_type.sample_format(); bands];
        dir.write_tag(Tag::SampleFormat, formats.as_slice()).map_err(write_err)?;
        dir.write_tag(Tag::Compression, 1u16).map_err(write_err)?;

        let rgb = bands == 3 || bands == 4;
        dir.write_tag(Tag::PhotometricInterpretation, if rgb { 2u16 } else { 1u16 })
            .map_err(write_err)?;
        dir.write_tag(Tag::SamplesPerPixel, bands as u16).map_err(write_err)?;
        dir.write_tag(Tag::PlanarConfiguration, 1u16).map_err(write_err)?;
        dir.write_tag(Tag::RowsPerStrip, rows_per_strip as u32)
            .map_err(write_err)?;

        let color_samples = if rgb { 3 } else { 1 };
        if bands > color_samples {
            let mut extra = vec![0u16; bands - color_samples];
            if bands == 4 {
                // Unassociated alpha
                extra[0] = 2;
            }
            dir.write_tag(Tag::ExtraSamples, extra.as_slice()).map_err(write_err)?;
        }

        dir.write_tag(Tag::ModelPixelScaleTag, &self.transform.pixel_scale()[..])
            .map_err(write_err)?;
        dir.write_tag(Tag::ModelTiepointTag, &self.transform.tiepoint()[..])
            .map_err(write_err)?;
        let geokeys = geokeys_for(self.crs, self.geographic);
        dir.write_tag(Tag::GeoKeyDirectoryTag, geokeys.as_slice())
            .map_err(write_err)?;

        let mut offsets: Vec<u32> = Vec::new();
        let mut counts: Vec<u32> = Vec::new();
        let width = self.width as usize;
        let bytes_per_sample = sample_type.bits() as usize / 8;
        let all_bands = &self.bands;

        for row0 in (0..self.height as usize).step_by(rows_per_strip) {
            let row1 = (row0 + rows_per_strip).min(self.height as usize);
            let range = row0 * width..row1 * width;

            macro_rules! write_strip {
                ($variant:ident) => {{
                    let planes: Vec<&[_]> = all_bands
                        .iter()
                        .filter_map(|b| match b {
                            BandSamples::$variant(v) => Some(&v[range.clone()]),
                            _ => None,
                        })
                        .collect();
                    let strip = interleave(&planes);
                    dir.write_data(strip.as_slice()).map_err(write_err)?
                }};
            }

            let offset = match all_bands[0] {
                BandSamples::U8(_) => write_strip!(U8),
                BandSamples::U16(_) => write_strip!(U16),
                BandSamples::U32(_) => write_strip!(U32),
                BandSamples::I8(_) => write_strip!(I8),
                BandSamples::I16(_) => write_strip!(I16),
                BandSamples::I32(_) => write_strip!(I32),
                BandSamples::F32(_) => write_strip!(F32),
                BandSamples::F64(_) => write_strip!(F64),
            };

            let offset = u32::try_from(offset)
                .map_err(|_| RasterError::Write("GeoTIFF exceeds 4 GiB".into()))?;
            offsets.push(offset);
            counts.push(((row1 - row0) * width * bands * bytes_per_sample) as u32);
        }

        dir.write_tag(Tag::StripOffsets, offsets.as_slice())
            .map_err(write_err)?;
        dir.write_tag(Tag::StripByteCounts, counts.as_slice())
            .map_err(write_err)?;
        dir.finish().map_err(write_err)?;
        Ok(())
    }
}

fn band_sample_type(band: &BandSamples) -> SampleType {
    match band {
        BandSamples::U8(_) => SampleType::U8,
        BandSamples::U16(_) => SampleType::U16,
        BandSamples::U32(_) => SampleType::U32,
        BandSamples::I8(_) => SampleType::I8,
        BandSamples::I16(_) => SampleType::I16,
        BandSamples::I32(_) => SampleType::I32,
        BandSamples::F32(_) => SampleType::F32,
        BandSamples::F64(_) => SampleType::F64,
    }
}

/// Band-sequential planes to pixel-interleaved samples.
fn interleave<T: Copy>(planes: &[&[T]]) -> Vec<T> {
    let len = planes.first().map(|p| p.len()).unwrap_or(0);
    let mut out = Vec::with_capacity(len * planes.len());
    for i in 0..len {
        for plane in planes {
            out.push(plane[i]);
        }
    }
    out
}

fn write_err(e: tiff::TiffError) -> RasterError {
    RasterError::Write(e.to_string())
}
