//! Band normalization and RGBA compositing.
//!
//! A [`CompositeStrategy`] is chosen once per raster from its band count and
//! data type, then applied to every window read from that raster.
//!
//! [`CompositeImage`] stores rows bottom-up: buffer row 0 is the southern
//! edge. Raster reads arrive north-first, so compositing reverses them and
//! PNG encoding reverses them back.

use raster_source::{BandDataType, BandSamples, RawWindow};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{RenderError, Result};
use crate::png::{create_png_auto, RowOrder};
use crate::rescale::RescaleRange;

/// How raw samples become 8-bit channel values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scaling {
    /// 8-bit data used as-is.
    Passthrough,
    /// Per-band stretch over the observed min/max of the window.
    MinMax,
    /// Fixed stretch shared across tiles.
    Fixed(RescaleRange),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBands {
    /// Band 0 replicated into R, G and B.
    Gray,
    /// Bands 0, 1, 2.
    Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaSource {
    /// Copy (or normalize, for non-8-bit data) a band.
    Band { index: usize, normalize: bool },
    /// 0 where every color band is zero, otherwise 255.
    ZeroMask,
}

/// Compositing plan for one raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeStrategy {
    pub color: ColorBands,
    pub scaling: Scaling,
    pub alpha: AlphaSource,
}

impl CompositeStrategy {
    /// Pick the strategy for a raster, in priority order:
    ///
    /// | data      | bands | color            | alpha        |
    /// |-----------|-------|------------------|--------------|
    /// | 8-bit     | 4+    | bands 1-3 as-is  | band 4       |
    /// | 8-bit     | 3     | bands 1-3 as-is  | zero-mask    |
    /// | wide/float| 4+    | bands 1-3 min-max| band 4 min-max |
    /// | wide/float| 3     | bands 1-3 min-max| zero-mask    |
    /// | any       | 2     | gray band 1      | band 2       |
    /// | any       | 1     | gray band 1      | zero-mask    |
    pub fn select(band_count: usize, data_type: BandDataType) -> Self {
        let eight_bit = data_type == BandDataType::UInt8;
        let scaling = if eight_bit {
            Scaling::Passthrough
        } else {
            Scaling::MinMax
        };

        let (color, alpha) = match band_count {
            0 | 1 => (ColorBands::Gray, AlphaSource::ZeroMask),
            2 => (
                ColorBands::Gray,
                AlphaSource::Band {
                    index: 1,
                    normalize: !eight_bit,
                },
            ),
            3 => (ColorBands::Rgb, AlphaSource::ZeroMask),
            _ => (
                ColorBands::Rgb,
                AlphaSource::Band {
                    index: 3,
                    normalize: !eight_bit,
                },
            ),
        };

        Self {
            color,
            scaling,
            alpha,
        }
    }

    /// Replace color scaling with a fixed stretch; alpha is unaffected.
    pub fn with_rescale(self, range: RescaleRange) -> Self {
        Self {
            scaling: Scaling::Fixed(range),
            ..self
        }
    }

    fn color_band_indices(&self) -> [usize; 3] {
        match self.color {
            ColorBands::Gray => [0, 0, 0],
            ColorBands::Rgb => [0, 1, 2],
        }
    }

    fn color_band_count(&self) -> usize {
        match self.color {
            ColorBands::Gray => 1,
            ColorBands::Rgb => 3,
        }
    }
}

/// Per-band sample to u8 mapping.
#[derive(Debug, Clone, Copy)]
enum Channel {
    Passthrough,
    Linear { min: f64, range: f64 },
    Fixed(RescaleRange),
    /// Constant or all-NaN band.
    Zero,
}

impl Channel {
    fn for_band(band: &BandSamples, scaling: Scaling) -> Self {
        match scaling {
            Scaling::Passthrough if band.as_u8().is_some() => Channel::Passthrough,
            Scaling::Fixed(range) => Channel::Fixed(range),
            Scaling::Passthrough | Scaling::MinMax => match band.min_max() {
                Some((min, max)) if max > min => Channel::Linear {
                    min,
                    range: max - min,
                },
                _ => Channel::Zero,
            },
        }
    }

    #[inline]
    fn apply(&self, band: &BandSamples, index: usize) -> u8 {
        match *self {
            Channel::Passthrough => band.as_u8().map(|v| v[index]).unwrap_or(0),
            Channel::Linear { min, range } => {
                let v = (band.value(index) - min) / range * 255.0;
                if v.is_nan() {
                    0
                } else {
                    v.clamp(0.0, 255.0) as u8
                }
            }
            Channel::Fixed(r) => r.apply(band.value(index)),
            Channel::Zero => 0,
        }
    }
}

/// An RGBA image, 8 bits per channel, rows stored bottom-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeImage {
    pub width: usize,
    pub height: usize,
    /// `width * height * 4` bytes; row 0 is the bottom row.
    pub pixels: Vec<u8>,
}

impl CompositeImage {
    /// Fully transparent image.
    pub fn transparent(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
        }
    }

    /// Build from top-down (north-first) RGBA rows.
    pub fn from_top_down(width: usize, height: usize, top_down: &[u8]) -> Self {
        let row_bytes = width * 4;
        let mut pixels = Vec::with_capacity(top_down.len());
        for row in top_down.chunks_exact(row_bytes.max(1)).rev() {
            pixels.extend_from_slice(row);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Byte offset of the pixel at column `x`, row `y` counted from the top.
    #[inline]
    pub fn offset(&self, x: usize, y_from_top: usize) -> usize {
        ((self.height - 1 - y_from_top) * self.width + x) * 4
    }

    /// RGBA at column `x`, row `y` counted from the top.
    pub fn pixel(&self, x: usize, y_from_top: usize) -> [u8; 4] {
        let o = self.offset(x, y_from_top);
        [
            self.pixels[o],
            self.pixels[o + 1],
            self.pixels[o + 2],
            self.pixels[o + 3],
        ]
    }

    /// Rows reordered north-first.
    pub fn to_top_down(&self) -> Vec<u8> {
        let row_bytes = self.width * 4;
        self.pixels
            .chunks_exact(row_bytes.max(1))
            .rev()
            .flatten()
            .copied()
            .collect()
    }

    pub fn is_fully_transparent(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Encode as PNG with north up.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        create_png_auto(&self.pixels, self.width, self.height, RowOrder::BottomUp)
    }
}

/// Composite raw bands into RGBA.
///
/// `existing_alpha`, when given, is a north-first mask with one value per
/// pixel and replaces the strategy's alpha source.
pub fn composite(
    raw: &RawWindow,
    strategy: &CompositeStrategy,
    existing_alpha: Option<&[u8]>,
) -> Result<CompositeImage> {
    let (width, height) = (raw.width, raw.height);
    let pixels = width * height;
    if let Some(mask) = existing_alpha {
        if mask.len() != pixels {
            return Err(RenderError::AlphaMismatch {
                expected: pixels,
                got: mask.len(),
            });
        }
    }
    if raw.bands.len() < strategy.color_band_count() {
        return Err(RenderError::NotEnoughBands {
            view: "composite",
            needed: strategy.color_band_count(),
            got: raw.bands.len(),
        });
    }

    debug!(width, height, bands = raw.bands.len(), ?strategy, "Compositing window");

    let color_idx = strategy.color_band_indices();
    let color_count = strategy.color_band_count();
    let channels: Vec<Channel> = color_idx
        .iter()
        .map(|&i| Channel::for_band(&raw.bands[i], strategy.scaling))
        .collect();

    let alpha_channel = match strategy.alpha {
        AlphaSource::Band { index, normalize } if index < raw.bands.len() => {
            let scaling = if normalize {
                Scaling::MinMax
            } else {
                Scaling::Passthrough
            };
            Some((index, Channel::for_band(&raw.bands[index], scaling)))
        }
        _ => None,
    };

    let mut image = CompositeImage::transparent(width, height);
    if pixels == 0 {
        return Ok(image);
    }

    image
        .pixels
        .par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(buffer_row, out)| {
            let src_row = height - 1 - buffer_row;
            for x in 0..width {
                let i = src_row * width + x;
                let o = x * 4;
                for c in 0..3 {
                    out[o + c] = channels[c].apply(&raw.bands[color_idx[c]], i);
                }
                out[o + 3] = match (existing_alpha, alpha_channel) {
                    (Some(mask), _) => mask[i],
                    (None, Some((band, channel))) => channel.apply(&raw.bands[band], i),
                    (None, None) => {
                        let empty = raw.bands[..color_count].iter().all(|b| b.is_zero(i));
                        if empty {
                            0
                        } else {
                            255
                        }
                    }
                };
            }
        });

    Ok(image)
}
