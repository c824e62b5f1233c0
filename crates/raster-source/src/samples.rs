//! Native sample storage for decoded bands.

use num_traits::ToPrimitive;
use planner_common::PixelWindow;
use serde::{Deserialize, Serialize};

use crate::geo::GeoTransform;

/// Per-sample storage type declared by the TIFF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl SampleType {
    /// Map TIFF SampleFormat and BitsPerSample to a sample type.
    pub fn from_tiff(sample_format: u16, bits: u16) -> Option<Self> {
        Some(match (sample_format, bits) {
            (1, 8) => SampleType::U8,
            (1, 16) => SampleType::U16,
            (1, 32) => SampleType::U32,
            (1, 64) => SampleType::U64,
            (2, 8) => SampleType::I8,
            (2, 16) => SampleType::I16,
            (2, 32) => SampleType::I32,
            (2, 64) => SampleType::I64,
            (3, 32) => SampleType::F32,
            (3, 64) => SampleType::F64,
            _ => return None,
        })
    }

    pub fn data_type(&self) -> BandDataType {
        match self {
            SampleType::U8 => BandDataType::UInt8,
            SampleType::F32 | SampleType::F64 => BandDataType::Float,
            _ => BandDataType::WideInt,
        }
    }

    pub fn bits(&self) -> u16 {
        match self {
            SampleType::U8 | SampleType::I8 => 8,
            SampleType::U16 | SampleType::I16 => 16,
            SampleType::U32 | SampleType::I32 | SampleType::F32 => 32,
            SampleType::U64 | SampleType::I64 | SampleType::F64 => 64,
        }
    }

    /// TIFF SampleFormat: 1 unsigned, 2 signed, 3 float.
    pub fn sample_format(&self) -> u16 {
        match self {
            SampleType::U8 | SampleType::U16 | SampleType::U32 | SampleType::U64 => 1,
            SampleType::I8 | SampleType::I16 | SampleType::I32 | SampleType::I64 => 2,
            SampleType::F32 | SampleType::F64 => 3,
        }
    }
}

/// Coarse classification that drives compositing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandDataType {
    /// 8-bit unsigned: displayed as-is.
    UInt8,
    /// Any other integer type: needs stretching.
    WideInt,
    Float,
}

/// One band of samples, row-major, in its native type.
///
/// 64-bit integers are widened to `F64` on read.
#[derive(Debug, Clone, PartialEq)]
pub enum BandSamples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! each_variant {
    ($self:expr, $v:ident => $body:expr) => {
        match $self {
            BandSamples::U8($v) => $body,
            BandSamples::U16($v) => $body,
            BandSamples::U32($v) => $body,
            BandSamples::I8($v) => $body,
            BandSamples::I16($v) => $body,
            BandSamples::I32($v) => $body,
            BandSamples::F32($v) => $body,
            BandSamples::F64($v) => $body,
        }
    };
}

impl BandSamples {
    pub fn len(&self) -> usize {
        each_variant!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample `index` as f64 (NaN for out-of-range indices).
    pub fn value(&self, index: usize) -> f64 {
        each_variant!(self, v => v.get(index).and_then(|x| x.to_f64()).unwrap_or(f64::NAN))
    }

    /// Whether sample `index` is exactly zero.
    pub fn is_zero(&self, index: usize) -> bool {
        self.value(index) == 0.0
    }

    /// Borrow 8-bit samples without conversion.
    pub fn as_u8(&self) -> Option<&[u8]> {
        match self {
            BandSamples::U8(v) => Some(v),
            _ => None,
        }
    }

    /// Observed `(min, max)` ignoring NaN, or `None` when no finite sample
    /// exists.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        for i in 0..self.len() {
            let v = self.value(i);
            if !v.is_finite() {
                continue;
            }
            range = Some(match range {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
        range
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.value(i)).collect()
    }
}

/// Decoded bands for one pixel window.
#[derive(Debug, Clone)]
pub struct RawWindow {
    /// The clamped source window that was read.
    pub window: PixelWindow,
    /// Sampling step (1 = every pixel).
    pub step: u32,
    /// Output grid width (`ceil(window.width / step)`).
    pub width: usize,
    /// Output grid height (`ceil(window.height / step)`).
    pub height: usize,
    pub data_type: BandDataType,
    pub bands: Vec<BandSamples>,
    /// Affine of the output grid.
    pub transform: GeoTransform,
}

impl RawWindow {
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_type_classification() {
        assert_eq!(SampleType::from_tiff(1, 8), Some(SampleType::U8));
        assert_eq!(SampleType::from_tiff(2, 16).unwrap().data_type(), BandDataType::WideInt);
        assert_eq!(SampleType::from_tiff(3, 32).unwrap().data_type(), BandDataType::Float);
        assert_eq!(SampleType::from_tiff(1, 12), None);
        assert_eq!(SampleType::from_tiff(3, 16), None);
    }

    #[test]
    fn test_min_max_ignores_nan() {
        let band = BandSamples::F32(vec![f32::NAN, 3.0, -1.0, f32::NAN]);
        assert_eq!(band.min_max(), Some((-1.0, 3.0)));
        assert_eq!(BandSamples::F32(vec![f32::NAN]).min_max(), None);
    }

    #[test]
    fn test_value_widening() {
        let band = BandSamples::I16(vec![-5, 7]);
        assert_eq!(band.value(0), -5.0);
        assert!(band.value(9).is_nan());
        assert!(!band.is_zero(1));
    }
}
