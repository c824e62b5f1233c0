//! Nearest-neighbour warping.

use std::io::{Read, Seek};

use planner_common::{BoundingBox, Crs, PixelWindow};
use projection::{is_geographic, CrsTransformer};
use raster_source::{BandSamples, GeoTransform, RasterData, RasterHandle};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{ReprojectError, Result};
use crate::grid::{default_output_grid, OutputGrid};

/// A freshly written raster in the target CRS.
#[derive(Debug, Clone)]
pub struct RasterArtifact {
    /// Encoded GeoTIFF.
    pub bytes: Vec<u8>,
    pub crs: Crs,
    pub width: u32,
    pub height: u32,
    pub band_count: usize,
    pub bounds: BoundingBox,
}

/// Warp an open raster into `target`. The source is only read.
pub fn reproject<R: Read + Seek>(handle: &mut RasterHandle<R>, target: Crs) -> Result<RasterArtifact> {
    let source = handle.crs().ok_or(ReprojectError::UndefinedCrs)?;
    let transformer = CrsTransformer::new(source, target)?;
    let grid = default_output_grid(&transformer, &handle.bounds(), handle.width(), handle.height())?;

    info!(
        from = %source,
        to = %target,
        src_width = handle.width(),
        src_height = handle.height(),
        dst_width = grid.width,
        dst_height = grid.height,
        "Reprojecting raster"
    );

    let raw = handle.read_window(PixelWindow::full(handle.width(), handle.height()))?;
    let bands = warp_bands(
        &raw.bands,
        &raw.transform,
        raw.width,
        raw.height,
        &transformer,
        &grid,
    );

    let data = RasterData {
        width: grid.width,
        height: grid.height,
        crs: target,
        geographic: is_geographic(target),
        transform: grid.transform,
        bands,
    };
    let bytes = data.to_geotiff_bytes()?;

    Ok(RasterArtifact {
        bytes,
        crs: target,
        width: grid.width,
        height: grid.height,
        band_count: data.bands.len(),
        bounds: grid.bounds(),
    })
}

/// Resample `bands` (a `width x height` grid placed by `source`) onto
/// `grid`. Output pixels whose centre maps outside the source, or fails to
/// transform, are 0.
pub fn warp_bands(
    bands: &[BandSamples],
    source: &GeoTransform,
    width: usize,
    height: usize,
    transformer: &CrsTransformer,
    grid: &OutputGrid,
) -> Vec<BandSamples> {
    let lookup = source_lookup(source, width, height, transformer, grid);
    let hits = lookup.iter().filter(|i| i.is_some()).count();
    debug!(
        pixels = lookup.len(),
        hits,
        "Built nearest-neighbour lookup"
    );

    bands
        .iter()
        .map(|band| match band {
            BandSamples::U8(v) => BandSamples::U8(take(v, &lookup)),
            BandSamples::U16(v) => BandSamples::U16(take(v, &lookup)),
            BandSamples::U32(v) => BandSamples::U32(take(v, &lookup)),
            BandSamples::I8(v) => BandSamples::I8(take(v, &lookup)),
            BandSamples::I16(v) => BandSamples::I16(take(v, &lookup)),
            BandSamples::I32(v) => BandSamples::I32(take(v, &lookup)),
            BandSamples::F32(v) => BandSamples::F32(take(v, &lookup)),
            BandSamples::F64(v) => BandSamples::F64(take(v, &lookup)),
        })
        .collect()
}

/// For every output pixel, the source sample index it copies (if any).
fn source_lookup(
    source: &GeoTransform,
    width: usize,
    height: usize,
    transformer: &CrsTransformer,
    grid: &OutputGrid,
) -> Vec<Option<usize>> {
    let out_width = grid.width as usize;
    let out_height = grid.height as usize;
    let mut lookup = vec![None; out_width * out_height];

    lookup
        .par_chunks_mut(out_width.max(1))
        .enumerate()
        .for_each(|(row, out)| {
            for (col, slot) in out.iter_mut().enumerate() {
                let (x, y) = grid
                    .transform
                    .pixel_to_world(col as f64 + 0.5, row as f64 + 0.5);
                let Ok((sx, sy)) = transformer.inverse(x, y) else {
                    continue;
                };
                let (c, r) = source.world_to_pixel(sx, sy);
                if c < 0.0 || r < 0.0 {
                    continue;
                }
                let (c, r) = (c.floor() as usize, r.floor() as usize);
                if c < width && r < height {
                    *slot = Some(r * width + c);
                }
            }
        });

    lookup
}

fn take<T: Copy + Default>(src: &[T], lookup: &[Option<usize>]) -> Vec<T> {
    lookup
        .iter()
        .map(|i| i.and_then(|i| src.get(i).copied()).unwrap_or_default())
        .collect()
}
