//! GeoTIFF raster adapter.
//!
//! Opens rasters from disk or memory, exposes their georeferencing, reads
//! pixel windows in the native sample type and writes derived rasters back
//! out as GeoTIFF.

pub mod error;
pub mod geo;
pub mod reader;
pub mod samples;
pub mod writer;

pub use error::{RasterError, Result};
pub use geo::GeoTransform;
pub use reader::{RasterHandle, RasterInfo, DEFAULT_MAX_PIXELS};
pub use samples::{BandDataType, BandSamples, RawWindow, SampleType};
pub use writer::RasterData;
