//! Open GeoTIFFs and read pixel windows.
//!
//! Only the strips or tiles intersecting a window are decoded. Reads can be
//! decimated with a sampling step, which is how previews and low zoom
//! levels avoid decoding every pixel of a large orthomosaic.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use bytes::Bytes;
use num_traits::ToPrimitive;
use planner_common::{BoundingBox, Crs, PixelWindow};
use serde::Serialize;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::debug;

use crate::error::{RasterError, Result};
use crate::geo::{crs_from_geokeys, GeoTransform};
use crate::samples::{BandDataType, BandSamples, RawWindow, SampleType};

/// Largest `width x height` accepted when opening a raster.
pub const DEFAULT_MAX_PIXELS: u64 = 1 << 30;

/// Immutable metadata of an open raster.
#[derive(Debug, Clone, Serialize)]
pub struct RasterInfo {
    pub width: u32,
    pub height: u32,
    pub band_count: usize,
    pub sample_type: SampleType,
    pub data_type: BandDataType,
    /// `None` when the file carries no usable EPSG code.
    pub crs: Option<Crs>,
    pub bounds: BoundingBox,
    pub transform: GeoTransform,
}

#[derive(Debug, Clone, Copy)]
struct ChunkLayout {
    chunk_width: u32,
    chunk_height: u32,
    chunks_across: u32,
}

/// An open raster. Owned by one operation; dropped (or [`close`]d) when it
/// ends.
///
/// [`close`]: RasterHandle::close
pub struct RasterHandle<R: Read + Seek = BufReader<File>> {
    decoder: Decoder<R>,
    info: RasterInfo,
    layout: ChunkLayout,
}

impl<R: Read + Seek> std::fmt::Debug for RasterHandle<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterHandle").field("info", &self.info).finish()
    }
}

impl RasterHandle<BufReader<File>> {
    /// Open a GeoTIFF on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let handle = Self::from_reader(BufReader::new(file))?;
        debug!(
            path = %path.display(),
            width = handle.info.width,
            height = handle.info.height,
            bands = handle.info.band_count,
            "Opened raster"
        );
        Ok(handle)
    }
}

impl RasterHandle<Cursor<Bytes>> {
    /// Open a GeoTIFF held in memory (e.g. an upload body).
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self> {
        Self::from_bytes_with_max_pixels(bytes, DEFAULT_MAX_PIXELS)
    }

    /// Open from memory, rejecting rasters larger than `max_pixels`.
    pub fn from_bytes_with_max_pixels(bytes: impl Into<Bytes>, max_pixels: u64) -> Result<Self> {
        Self::from_reader_with_max_pixels(Cursor::new(bytes.into()), max_pixels)
    }
}

impl<R: Read + Seek> RasterHandle<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        Self::from_reader_with_max_pixels(reader, DEFAULT_MAX_PIXELS)
    }

    /// Open from any seekable reader. The header is checked against
    /// `max_pixels` before anything is decoded, since a full read
    /// allocates every pixel the header declares.
    pub fn from_reader_with_max_pixels(reader: R, max_pixels: u64) -> Result<Self> {
        let mut decoder = Decoder::new(reader)
            .map_err(|e| RasterError::unreadable(format!("not a TIFF: {}", e)))?;

        let (width, height) = decoder.dimensions()?;
        if width == 0 || height == 0 {
            return Err(RasterError::unreadable("raster has no pixels"));
        }
        let pixels = u64::from(width) * u64::from(height);
        if pixels > max_pixels {
            return Err(RasterError::unreadable(format!(
                "{}x{} raster exceeds the limit of {} pixels",
                width, height, max_pixels
            )));
        }

        let band_count = decoder
            .find_tag_unsigned::<u32>(Tag::SamplesPerPixel)?
            .unwrap_or(1) as usize;
        if band_count == 0 {
            return Err(RasterError::unreadable("raster has no bands"));
        }

        let planar = decoder
            .find_tag_unsigned::<u16>(Tag::PlanarConfiguration)?
            .unwrap_or(1);
        if planar != 1 {
            return Err(RasterError::unreadable(
                "planar-separate layout is not supported",
            ));
        }

        let sample_type = read_sample_type(&mut decoder)?;
        let transform = read_transform(&mut decoder)?;
        let crs = decoder
            .find_tag_unsigned_vec::<u16>(Tag::GeoKeyDirectoryTag)?
            .and_then(|keys| crs_from_geokeys(&keys));

        let tiled = decoder.find_tag(Tag::TileWidth)?.is_some();
        let (chunk_width, chunk_height) = decoder.chunk_dimensions();
        let chunk_height = chunk_height.clamp(1, height);
        let layout = ChunkLayout {
            chunk_width: if tiled { chunk_width.max(1) } else { width },
            chunk_height,
            chunks_across: if tiled {
                width.div_ceil(chunk_width.max(1))
            } else {
                1
            },
        };

        let info = RasterInfo {
            width,
            height,
            band_count,
            sample_type,
            data_type: sample_type.data_type(),
            crs,
            bounds: transform.bounds(width, height),
            transform,
        };

        Ok(Self {
            decoder,
            info,
            layout,
        })
    }

    pub fn info(&self) -> &RasterInfo {
        &self.info
    }

    pub fn width(&self) -> u32 {
        self.info.width
    }

    pub fn height(&self) -> u32 {
        self.info.height
    }

    pub fn band_count(&self) -> usize {
        self.info.band_count
    }

    pub fn crs(&self) -> Option<Crs> {
        self.info.crs
    }

    pub fn bounds(&self) -> BoundingBox {
        self.info.bounds
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.info.transform
    }

    pub fn data_type(&self) -> BandDataType {
        self.info.data_type
    }

    /// Map a bbox in the raster's CRS onto a clamped pixel window.
    pub fn window_for_bounds(&self, bbox: &BoundingBox) -> Result<PixelWindow> {
        let overlap = self
            .info
            .bounds
            .intersection(bbox)
            .ok_or(RasterError::BoundsOutOfRange)?;
        let window = self.info.transform.window_covering(&overlap);
        self.clamp(window)
    }

    /// Read every band over `window` at full resolution.
    pub fn read_window(&mut self, window: PixelWindow) -> Result<RawWindow> {
        self.read_window_strided(window, 1)
    }

    /// Read every band over `window`, keeping every `step`-th pixel in both
    /// directions. A partially overlapping window is clamped first.
    pub fn read_window_strided(&mut self, window: PixelWindow, step: u32) -> Result<RawWindow> {
        let window = self.clamp(window)?;
        let step = step.max(1);

        let rows: Vec<u32> = (window.row_off..window.row_end())
            .step_by(step as usize)
            .map(|r| r as u32)
            .collect();
        let cols: Vec<u32> = (window.col_off..window.col_end())
            .step_by(step as usize)
            .map(|c| c as u32)
            .collect();

        let bands = match self.info.sample_type {
            SampleType::U8 => split(self.gather(&rows, &cols, u8_samples)?, BandSamples::U8),
            SampleType::U16 => split(self.gather(&rows, &cols, u16_samples)?, BandSamples::U16),
            SampleType::U32 => split(self.gather(&rows, &cols, u32_samples)?, BandSamples::U32),
            SampleType::I8 => split(self.gather(&rows, &cols, i8_samples)?, BandSamples::I8),
            SampleType::I16 => split(self.gather(&rows, &cols, i16_samples)?, BandSamples::I16),
            SampleType::I32 => split(self.gather(&rows, &cols, i32_samples)?, BandSamples::I32),
            SampleType::F32 => split(self.gather(&rows, &cols, f32_samples)?, BandSamples::F32),
            SampleType::U64 | SampleType::I64 | SampleType::F64 => {
                split(self.gather(&rows, &cols, f64_samples)?, BandSamples::F64)
            }
        };

        Ok(RawWindow {
            window,
            step,
            width: cols.len(),
            height: rows.len(),
            data_type: self.info.data_type,
            bands,
            transform: self.info.transform.for_window(&window, step),
        })
    }

    /// Release the handle.
    pub fn close(self) {}

    fn clamp(&self, window: PixelWindow) -> Result<PixelWindow> {
        window
            .clamp_to(self.info.width, self.info.height)
            .ok_or(RasterError::WindowOutOfRange {
                window,
                width: self.info.width,
                height: self.info.height,
            })
    }

    /// Decode the chunks holding the sampled `rows x cols` and scatter them
    /// into one plane per band.
    fn gather<T: Copy + Default>(
        &mut self,
        rows: &[u32],
        cols: &[u32],
        extract: fn(DecodingResult) -> Option<Vec<T>>,
    ) -> Result<Vec<Vec<T>>> {
        let spp = self.info.band_count;
        let out_width = cols.len();
        let mut planes = vec![vec![T::default(); out_width * rows.len()]; spp];
        let ChunkLayout {
            chunk_width: cw,
            chunk_height: ch,
            chunks_across,
        } = self.layout;

        let (Some(&first_row), Some(&last_row)) = (rows.first(), rows.last()) else {
            return Ok(planes);
        };
        let (Some(&first_col), Some(&last_col)) = (cols.first(), cols.last()) else {
            return Ok(planes);
        };

        for chunk_row in (first_row / ch)..=(last_row / ch) {
            let row_start = chunk_row * ch;
            let row_end = (row_start + ch).min(self.info.height);
            let chunk_rows: Vec<(usize, u32)> = rows
                .iter()
                .enumerate()
                .filter(|(_, r)| **r >= row_start && **r < row_end)
                .map(|(i, r)| (i, *r))
                .collect();
            if chunk_rows.is_empty() {
                continue;
            }

            for chunk_col in (first_col / cw)..=(last_col / cw) {
                let col_start = chunk_col * cw;
                let col_end = (col_start + cw).min(self.info.width);
                let chunk_cols: Vec<(usize, u32)> = cols
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| **c >= col_start && **c < col_end)
                    .map(|(i, c)| (i, *c))
                    .collect();
                if chunk_cols.is_empty() {
                    continue;
                }

                let index = chunk_row * chunks_across + chunk_col;
                let decoded = self.decoder.read_chunk(index)?;
                let data = extract(decoded).ok_or_else(|| {
                    RasterError::unreadable("chunk sample type does not match the header")
                })?;

                // Edge tiles may come back padded to the full tile size or
                // trimmed to the data extent.
                let data_width = (col_end - col_start) as usize;
                let data_height = (row_end - row_start) as usize;
                let stride = if data.len() >= cw as usize * ch as usize * spp {
                    cw as usize
                } else {
                    data_width
                };
                if data.len() < stride * data_height * spp {
                    return Err(RasterError::unreadable(format!(
                        "chunk {} is truncated ({} samples)",
                        index,
                        data.len()
                    )));
                }

                for &(out_row, src_row) in &chunk_rows {
                    let local_row = (src_row - row_start) as usize;
                    for &(out_col, src_col) in &chunk_cols {
                        let local_col = (src_col - col_start) as usize;
                        let base = (local_row * stride + local_col) * spp;
                        let dst = out_row * out_width + out_col;
                        for (band, plane) in planes.iter_mut().enumerate() {
                            plane[dst] = data[base + band];
                        }
                    }
                }
            }
        }

        Ok(planes)
    }
}

fn split<T>(planes: Vec<Vec<T>>, wrap: fn(Vec<T>) -> BandSamples) -> Vec<BandSamples> {
    planes.into_iter().map(wrap).collect()
}

fn u8_samples(r: DecodingResult) -> Option<Vec<u8>> {
    match r {
        DecodingResult::U8(v) => Some(v),
        _ => None,
    }
}

fn u16_samples(r: DecodingResult) -> Option<Vec<u16>> {
    match r {
        DecodingResult::U16(v) => Some(v),
        _ => None,
    }
}

fn u32_samples(r: DecodingResult) -> Option<Vec<u32>> {
    match r {
        DecodingResult::U32(v) => Some(v),
        _ => None,
    }
}

fn i8_samples(r: DecodingResult) -> Option<Vec<i8>> {
    match r {
        DecodingResult::I8(v) => Some(v),
        _ => None,
    }
}

fn i16_samples(r: DecodingResult) -> Option<Vec<i16>> {
    match r {
        DecodingResult::I16(v) => Some(v),
        _ => None,
    }
}

fn i32_samples(r: DecodingResult) -> Option<Vec<i32>> {
    match r {
        DecodingResult::I32(v) => Some(v),
        _ => None,
    }
}

fn f32_samples(r: DecodingResult) -> Option<Vec<f32>> {
    match r {
        DecodingResult::F32(v) => Some(v),
        _ => None,
    }
}

/// 64-bit samples of any kind, widened to f64.
fn f64_samples(r: DecodingResult) -> Option<Vec<f64>> {
    match r {
        DecodingResult::F64(v) => Some(v),
        DecodingResult::U64(v) => Some(v.iter().map(|x| x.to_f64().unwrap_or(f64::NAN)).collect()),
        DecodingResult::I64(v) => Some(v.iter().map(|x| x.to_f64().unwrap_or(f64::NAN)).collect()),
        _ => None,
    }
}

fn read_sample_type<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<SampleType> {
    // A single-valued SHORT tag decodes as a scalar, a per-band one as a
    // list; the unsigned-vec lookup accepts both.
    let bits = decoder
        .find_tag_unsigned_vec::<u16>(Tag::BitsPerSample)?
        .unwrap_or_else(|| vec![1]);
    let formats = decoder
        .find_tag_unsigned_vec::<u16>(Tag::SampleFormat)?
        .unwrap_or_else(|| vec![1]);

    let first_bits = bits.first().copied().unwrap_or(1);
    if bits.iter().any(|b| *b != first_bits) {
        return Err(RasterError::unreadable("bands have mixed bit depths"));
    }
    let format = formats.first().copied().unwrap_or(1);

    SampleType::from_tiff(format, first_bits).ok_or_else(|| {
        RasterError::unreadable(format!(
            "unsupported sample layout: format {} with {} bits",
            format, first_bits
        ))
    })
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoTransform> {
    let scale = decoder.find_tag(Tag::ModelPixelScaleTag)?;
    let tiepoint = decoder.find_tag(Tag::ModelTiepointTag)?;
    if let (Some(scale), Some(tiepoint)) = (scale, tiepoint) {
        return GeoTransform::from_scale_and_tiepoint(&scale.into_f64_vec()?, &tiepoint.into_f64_vec()?)
            .ok_or_else(|| RasterError::unreadable("invalid ModelPixelScale/ModelTiepoint"));
    }

    if let Some(matrix) = decoder.find_tag(Tag::ModelTransformationTag)? {
        return GeoTransform::from_model_transformation(&matrix.into_f64_vec()?)
            .ok_or_else(|| RasterError::unreadable("rotated or invalid ModelTransformation"));
    }

    Err(RasterError::unreadable("missing georeferencing tags"))
}
