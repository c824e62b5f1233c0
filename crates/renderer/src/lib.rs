//! Raster compositing and PNG rendering.
//!
//! - [`composite`]: raw bands to RGBA under a per-raster strategy
//! - [`index`]: VARI / GNDVI views and their histogram
//! - [`png`]: RGBA and indexed PNG encoding

pub mod colormap;
pub mod composite;
pub mod error;
pub mod index;
pub mod png;
pub mod rescale;

pub use colormap::{Color, Colormap};
pub use composite::{composite, AlphaSource, ColorBands, CompositeImage, CompositeStrategy, Scaling};
pub use error::{RenderError, Result};
pub use index::{compute_index, histogram, render_index, IndexClip, IndexHistogram, VegetationIndex};
pub use rescale::RescaleRange;
