//! Full-canvas previews and index histograms.

use std::io::{Read, Seek};
use std::path::Path;

use planner_common::PixelWindow;
use raster_source::{RasterHandle, RawWindow};
use renderer::{
    composite, compute_index, histogram, render_index, Colormap, CompositeImage,
    CompositeStrategy, IndexClip, IndexHistogram, VegetationIndex,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TileError};

/// Default sampling step for previews.
pub const DEFAULT_PREVIEW_DOWNSAMPLE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewView {
    #[default]
    Rgb,
    Vari,
    Gndvi,
}

impl PreviewView {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "rgb" => Ok(PreviewView::Rgb),
            "vari" => Ok(PreviewView::Vari),
            "gndvi" => Ok(PreviewView::Gndvi),
            other => Err(TileError::invalid_parameter(
                "view",
                format!("unknown view '{}', expected rgb, vari or gndvi", other),
            )),
        }
    }

    pub fn index(&self) -> Option<VegetationIndex> {
        match self {
            PreviewView::Rgb => None,
            PreviewView::Vari => Some(VegetationIndex::Vari),
            PreviewView::Gndvi => Some(VegetationIndex::Gndvi),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewOptions {
    pub view: PreviewView,
    pub colormap: Colormap,
    /// Keep every n-th pixel in both directions.
    pub downsample: u32,
    pub clip: Option<IndexClip>,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            view: PreviewView::Rgb,
            colormap: Colormap::default(),
            downsample: DEFAULT_PREVIEW_DOWNSAMPLE,
            clip: None,
        }
    }
}

/// Render the whole raster at `path` as a north-up PNG.
pub fn render_preview(path: impl AsRef<Path>, options: &PreviewOptions) -> Result<Vec<u8>> {
    let mut handle = RasterHandle::open(path.as_ref())?;
    let image = preview_image(&mut handle, options)?;
    handle.close();
    Ok(image.to_png()?)
}

pub fn preview_image<R: Read + Seek>(
    handle: &mut RasterHandle<R>,
    options: &PreviewOptions,
) -> Result<CompositeImage> {
    let raw = read_canvas(handle, options.downsample)?;
    let image = match options.view.index() {
        None => {
            let strategy = CompositeStrategy::select(handle.band_count(), handle.data_type());
            composite(&raw, &strategy, None)?
        }
        Some(index) => render_index(&raw, index, options.colormap, options.clip)?,
    };
    Ok(image)
}

/// Histogram of `index` over the opaque pixels of the raster at `path`.
pub fn index_histogram(
    path: impl AsRef<Path>,
    index: VegetationIndex,
    downsample: u32,
) -> Result<IndexHistogram> {
    let mut handle = RasterHandle::open(path.as_ref())?;
    let raw = read_canvas(&mut handle, downsample)?;
    handle.close();
    Ok(histogram(&compute_index(&raw, index)?))
}

fn read_canvas<R: Read + Seek>(handle: &mut RasterHandle<R>, downsample: u32) -> Result<RawWindow> {
    if downsample == 0 {
        return Err(TileError::invalid_parameter("downsample", "must be at least 1"));
    }
    let window = PixelWindow::full(handle.width(), handle.height());
    debug!(window = %window, step = downsample, "Reading preview canvas");
    Ok(handle.read_window_strided(window, downsample)?)
}
