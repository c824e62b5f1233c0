//! XYZ tiles and full-canvas previews from GeoTIFF rasters.
//!
//! Every call opens its own [`raster_source::RasterHandle`] and releases it
//! before returning, so the functions here are safe to run concurrently on
//! a blocking pool.

pub mod error;
pub mod preview;
pub mod tile;

pub use error::{Result, TileError};
pub use preview::{
    index_histogram, preview_image, render_preview, PreviewOptions, PreviewView,
    DEFAULT_PREVIEW_DOWNSAMPLE,
};
pub use tile::{render_tile, tile_image, transparent_tile, RenderedTile, TileOutcome};
