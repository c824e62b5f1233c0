//! Visible-band vegetation indices (VARI, GNDVI) and their histogram.
//!
//! Both indices work on R, G, B after each band is stretched to 0..1 over its
//! own min/max, and are clipped to [-1, 1]. Pixels where the raw R, G and B
//! are all zero are transparent and carry NaN.

use raster_source::{BandSamples, RawWindow};
use rayon::prelude::*;
use serde::Serialize;

use crate::colormap::Colormap;
use crate::composite::CompositeImage;
use crate::error::{RenderError, Result};

/// Number of histogram bins over [-1, 1].
pub const HISTOGRAM_BINS: usize = 125;

const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VegetationIndex {
    /// Visible Atmospherically Resistant Index: (g - r) / (g + r - b).
    Vari,
    /// Green-band NDVI substitute: (g - b) / (g + b).
    Gndvi,
}

impl VegetationIndex {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "vari" => Ok(VegetationIndex::Vari),
            "gndvi" => Ok(VegetationIndex::Gndvi),
            other => Err(RenderError::invalid_parameter(
                "index",
                format!("unknown index '{}', expected vari or gndvi", other),
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VegetationIndex::Vari => "vari",
            VegetationIndex::Gndvi => "gndvi",
        }
    }

    #[inline]
    fn evaluate(&self, r: f64, g: f64, b: f64) -> f64 {
        let v = match self {
            VegetationIndex::Vari => (g - r) / (g + r - b + EPSILON),
            VegetationIndex::Gndvi => (g - b) / (g + b + EPSILON),
        };
        v.clamp(-1.0, 1.0)
    }
}

/// User clip: values below `lo` become -1, above `hi` become 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexClip {
    pub lo: f64,
    pub hi: f64,
}

impl IndexClip {
    /// Parse "lo,hi" with finite `lo <= hi`.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || RenderError::invalid_parameter("clip", format!("expected 'lo,hi', got '{}'", s));
        let (lo, hi) = s.split_once(',').ok_or_else(invalid)?;
        let lo: f64 = lo.trim().parse().map_err(|_| invalid())?;
        let hi: f64 = hi.trim().parse().map_err(|_| invalid())?;
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(invalid());
        }
        Ok(Self { lo, hi })
    }

    #[inline]
    pub fn apply(&self, v: f64) -> f64 {
        if v < self.lo {
            -1.0
        } else if v > self.hi {
            1.0
        } else {
            v
        }
    }
}

/// Band stretched to 0..1; constant or all-NaN bands become 0.
fn unit_band(band: &BandSamples) -> Vec<f64> {
    match band.min_max() {
        Some((min, max)) if max > min => (0..band.len())
            .map(|i| {
                let v = (band.value(i) - min) / (max - min);
                if v.is_nan() {
                    0.0
                } else {
                    v
                }
            })
            .collect(),
        _ => vec![0.0; band.len()],
    }
}

fn require_rgb(raw: &RawWindow, view: &'static str) -> Result<()> {
    if raw.bands.len() < 3 {
        return Err(RenderError::NotEnoughBands {
            view,
            needed: 3,
            got: raw.bands.len(),
        });
    }
    Ok(())
}

/// Per-pixel index values in north-first order, NaN where transparent.
pub fn compute_index(raw: &RawWindow, index: VegetationIndex) -> Result<Vec<f64>> {
    require_rgb(raw, index.name())?;

    let r = unit_band(&raw.bands[0]);
    let g = unit_band(&raw.bands[1]);
    let b = unit_band(&raw.bands[2]);

    let values = (0..raw.pixel_count())
        .into_par_iter()
        .map(|i| {
            if raw.bands[..3].iter().all(|band| band.is_zero(i)) {
                f64::NAN
            } else {
                index.evaluate(r[i], g[i], b[i])
            }
        })
        .collect();
    Ok(values)
}

/// Colour an index through `colormap`; transparent pixels stay transparent.
pub fn render_index(
    raw: &RawWindow,
    index: VegetationIndex,
    colormap: Colormap,
    clip: Option<IndexClip>,
) -> Result<CompositeImage> {
    let values = compute_index(raw, index)?;
    let (width, height) = (raw.width, raw.height);
    let mut image = CompositeImage::transparent(width, height);
    if width == 0 || height == 0 {
        return Ok(image);
    }

    image
        .pixels
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(buffer_row, out)| {
            let src_row = height - 1 - buffer_row;
            for x in 0..width {
                let v = values[src_row * width + x];
                if v.is_nan() {
                    continue;
                }
                let v = clip.map_or(v, |c| c.apply(v));
                let color = colormap.color_at(((v + 1.0) / 2.0) as f32);
                out[x * 4..x * 4 + 4].copy_from_slice(&[color.r, color.g, color.b, 255]);
            }
        });

    Ok(image)
}

/// Histogram of index values with `HISTOGRAM_BINS` equal bins over [-1, 1].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexHistogram {
    pub counts: Vec<u64>,
    /// `HISTOGRAM_BINS + 1` bin edges.
    pub edges: Vec<f64>,
}

/// Bin finite values in [-1, 1]; the last bin includes 1.0. NaN and values
/// outside the range are skipped.
pub fn histogram(values: &[f64]) -> IndexHistogram {
    let bins = HISTOGRAM_BINS;
    let edges: Vec<f64> = (0..=bins)
        .map(|i| -1.0 + 2.0 * i as f64 / bins as f64)
        .collect();

    let mut counts = vec![0u64; bins];
    for &v in values {
        if !(-1.0..=1.0).contains(&v) {
            continue;
        }
        let bin = (((v + 1.0) / 2.0) * bins as f64) as usize;
        counts[bin.min(bins - 1)] += 1;
    }

    IndexHistogram { counts, edges }
}
