//! XYZ tile rendering.
//!
//! A tile is rendered by carrying its Web Mercator bounds into the raster
//! CRS, reading the covering window (strided for low zooms), compositing it,
//! and resampling the composite onto the tile grid by nearest neighbour
//! through the inverse transform. Tiles that miss the raster come back as a
//! fully transparent PNG of the requested size.

use std::io::{Read, Seek};
use std::path::Path;

use planner_common::{BoundingBox, Crs, PixelWindow, TileAddress};
use projection::CrsTransformer;
use raster_source::{GeoTransform, RasterHandle};
use rayon::prelude::*;
use renderer::{composite, CompositeImage, CompositeStrategy, RescaleRange};
use tracing::{debug, warn};

use crate::error::{Result, TileError};

/// Points sampled per tile edge when carrying tile bounds into the raster CRS.
const TILE_EDGE_SAMPLES: usize = 21;

/// Whether a tile had anything to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOutcome {
    Rendered,
    /// Outside the raster or fully transparent.
    Empty,
}

impl TileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TileOutcome::Rendered => "rendered",
            TileOutcome::Empty => "empty",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedTile {
    pub png: Vec<u8>,
    pub outcome: TileOutcome,
}

/// Fully transparent `size x size` PNG.
pub fn transparent_tile(size: u32) -> Result<Vec<u8>> {
    let size = check_tile_size(size)?;
    Ok(CompositeImage::transparent(size, size).to_png()?)
}

/// Render one XYZ tile of the raster at `path`.
///
/// `rescale` is the raw "min,max" query value; a malformed value is logged
/// and the tile renders without it.
pub fn render_tile(
    path: impl AsRef<Path>,
    address: TileAddress,
    tile_size: u32,
    rescale: Option<&str>,
) -> Result<RenderedTile> {
    let size = check_tile_size(tile_size)?;
    let rescale = rescale.and_then(|value| match RescaleRange::parse(value) {
        Ok(range) => Some(range),
        Err(e) => {
            warn!(rescale = value, error = %e, "Ignoring invalid rescale parameter");
            None
        }
    });

    let mut handle = RasterHandle::open(path.as_ref())?;
    let image = tile_image(&mut handle, address, size, rescale)?;
    handle.close();

    encode(image, size)
}

/// Composite for one tile, or `None` when the tile does not touch the raster.
pub fn tile_image<R: Read + Seek>(
    handle: &mut RasterHandle<R>,
    address: TileAddress,
    tile_size: usize,
    rescale: Option<RescaleRange>,
) -> Result<Option<CompositeImage>> {
    if !address.is_valid() {
        debug!(z = address.z, x = address.x, y = address.y, "Tile outside the pyramid");
        return Ok(None);
    }

    let crs = handle.crs().ok_or(TileError::UndefinedCrs)?;
    let transformer = CrsTransformer::new(crs, Crs::WEB_MERCATOR)?;
    let tile_bounds = address.web_mercator_bounds();

    let source_bounds = match transformer.inverse_bounds(&tile_bounds, TILE_EDGE_SAMPLES) {
        Ok(bounds) => bounds,
        Err(e) => {
            debug!(error = %e, "Tile bounds have no image in the raster CRS");
            return Ok(None);
        }
    };

    let window = match handle.window_for_bounds(&source_bounds) {
        Ok(window) => window,
        Err(e) if e.is_out_of_range() => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let step = read_step(&window, tile_size);
    let raw = handle.read_window_strided(window, step)?;

    let mut strategy = CompositeStrategy::select(handle.band_count(), handle.data_type());
    if let Some(range) = rescale {
        strategy = strategy.with_rescale(range);
    }
    let image = composite(&raw, &strategy, None)?;

    debug!(
        z = address.z,
        x = address.x,
        y = address.y,
        window = %window,
        step = step,
        "Resampling composite onto tile"
    );

    Ok(Some(resample_to_tile(
        &image,
        &raw.transform,
        &transformer,
        &tile_bounds,
        tile_size,
    )))
}

pub(crate) fn check_tile_size(tile_size: u32) -> Result<usize> {
    if tile_size == 0 {
        return Err(TileError::invalid_parameter("size", "tile size must be positive"));
    }
    Ok(tile_size as usize)
}

fn encode(image: Option<CompositeImage>, size: usize) -> Result<RenderedTile> {
    let image = image.unwrap_or_else(|| CompositeImage::transparent(size, size));
    let outcome = if image.is_fully_transparent() {
        TileOutcome::Empty
    } else {
        TileOutcome::Rendered
    };
    Ok(RenderedTile {
        png: image.to_png()?,
        outcome,
    })
}

/// Sampling step: windows more than twice the tile size are decimated
/// down to roughly one source pixel per tile pixel.
fn read_step(window: &PixelWindow, tile_size: usize) -> u32 {
    let longest = window.width.max(window.height);
    let tile_size = tile_size as u64;
    if longest > 2 * tile_size {
        (longest / tile_size).min(u32::MAX as u64) as u32
    } else {
        1
    }
}

/// Nearest-neighbour resample of `image` (laid out on `grid` in the source
/// CRS) onto a `size x size` tile covering `tile_bounds` in Web Mercator.
fn resample_to_tile(
    image: &CompositeImage,
    grid: &GeoTransform,
    transformer: &CrsTransformer,
    tile_bounds: &BoundingBox,
    size: usize,
) -> CompositeImage {
    let mut tile = CompositeImage::transparent(size, size);
    let res_x = tile_bounds.width() / size as f64;
    let res_y = tile_bounds.height() / size as f64;

    tile.pixels
        .par_chunks_mut(size * 4)
        .enumerate()
        .for_each(|(buffer_row, out)| {
            let row = size - 1 - buffer_row;
            let y = tile_bounds.max_y - (row as f64 + 0.5) * res_y;
            for col in 0..size {
                let x = tile_bounds.min_x + (col as f64 + 0.5) * res_x;
                let (sx, sy) = match transformer.inverse(x, y) {
                    Ok(p) => p,
                    Err(_) => continue,
                };
                let (c, r) = grid.world_to_pixel(sx, sy);
                // Also rejects NaN.
                if !(c >= 0.0 && r >= 0.0) {
                    continue;
                }
                let (c, r) = (c as usize, r as usize);
                if c >= image.width || r >= image.height {
                    continue;
                }
                out[col * 4..col * 4 + 4].copy_from_slice(&image.pixel(c, r));
            }
        });

    tile
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_step() {
        assert_eq!(read_step(&PixelWindow::new(0, 0, 512, 100), 256), 1);
        assert_eq!(read_step(&PixelWindow::new(0, 0, 513, 100), 256), 2);
        assert_eq!(read_step(&PixelWindow::new(0, 0, 100, 4096), 256), 16);
    }

    #[test]
    fn test_zero_tile_size_rejected() {
        assert!(matches!(
            transparent_tile(0),
            Err(TileError::InvalidParameter { param: "size", .. })
        ));
    }

    #[test]
    fn test_transparent_tile_is_small() {
        let png = transparent_tile(256).unwrap();
        assert!(png.len() < 2048, "transparent tile is {} bytes", png.len());
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(TileOutcome::Rendered.as_str(), "rendered");
        assert_eq!(TileOutcome::Empty.as_str(), "empty");
    }
}
