//! Fixed linear stretch applied to tiles via `rescale=min,max`.

use crate::error::{RenderError, Result};

/// A `[min, max]` input range mapped onto `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RescaleRange {
    pub min: f64,
    pub max: f64,
}

impl RescaleRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min == max {
            return Err(RenderError::RescaleParameterInvalid(format!("{},{}", min, max)));
        }
        Ok(Self { min, max })
    }

    /// Parse "min,max".
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || RenderError::RescaleParameterInvalid(s.to_string());
        let (min, max) = s.split_once(',').ok_or_else(invalid)?;
        let min: f64 = min.trim().parse().map_err(|_| invalid())?;
        let max: f64 = max.trim().parse().map_err(|_| invalid())?;
        Self::new(min, max).map_err(|_| invalid())
    }

    /// `(v - min) / (max - min) * 255`, clipped to [0, 255] and truncated.
    /// NaN maps to 0.
    pub fn apply(&self, v: f64) -> u8 {
        let scaled = (v - self.min) / (self.max - self.min) * 255.0;
        if scaled.is_nan() {
            0
        } else {
            scaled.clamp(0.0, 255.0) as u8
        }
    }
}

impl std::str::FromStr for RescaleRange {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let r = RescaleRange::parse("0, 4000").unwrap();
        assert_eq!(r, RescaleRange { min: 0.0, max: 4000.0 });
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["", "5", "a,b", "1,1", "1,2,3", "nan,4", "0,inf"] {
            assert!(
                matches!(RescaleRange::parse(bad), Err(RenderError::RescaleParameterInvalid(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_apply_clips_and_truncates() {
        let r = RescaleRange::new(100.0, 200.0).unwrap();
        assert_eq!(r.apply(50.0), 0);
        assert_eq!(r.apply(150.0), 127);
        assert_eq!(r.apply(200.0), 255);
        assert_eq!(r.apply(1e9), 255);
        assert_eq!(r.apply(f64::NAN), 0);
    }

    #[test]
    fn test_inverted_range() {
        let r = RescaleRange::new(200.0, 100.0).unwrap();
        assert_eq!(r.apply(200.0), 0);
        assert_eq!(r.apply(100.0), 255);
    }
}
