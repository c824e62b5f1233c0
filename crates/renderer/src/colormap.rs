//! Colors and the colormaps used for vegetation index views.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Linear color interpolation, `t` clamped to [0, 1].
pub fn interpolate_color(from: Color, to: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f32 * (1.0 - t) + b as f32 * t) as u8;
    Color::new(mix(from.r, to.r), mix(from.g, to.g), mix(from.b, to.b), mix(from.a, to.a))
}

const RDYLGN: [Color; 11] = [
    Color::new(0xa5, 0x00, 0x26, 255),
    Color::new(0xd7, 0x30, 0x27, 255),
    Color::new(0xf4, 0x6d, 0x43, 255),
    Color::new(0xfd, 0xae, 0x61, 255),
    Color::new(0xfe, 0xe0, 0x8b, 255),
    Color::new(0xff, 0xff, 0xbf, 255),
    Color::new(0xd9, 0xef, 0x8b, 255),
    Color::new(0xa6, 0xd9, 0x6a, 255),
    Color::new(0x66, 0xbd, 0x63, 255),
    Color::new(0x1a, 0x98, 0x50, 255),
    Color::new(0x00, 0x68, 0x37, 255),
];

const VIRIDIS: [Color; 5] = [
    Color::new(0x44, 0x01, 0x54, 255),
    Color::new(0x3b, 0x52, 0x8b, 255),
    Color::new(0x21, 0x91, 0x8c, 255),
    Color::new(0x5e, 0xc9, 0x62, 255),
    Color::new(0xfd, 0xe7, 0x25, 255),
];

const PLASMA: [Color; 5] = [
    Color::new(0x0d, 0x08, 0x87, 255),
    Color::new(0x7e, 0x03, 0xa8, 255),
    Color::new(0xcc, 0x47, 0x78, 255),
    Color::new(0xf8, 0x95, 0x40, 255),
    Color::new(0xf0, 0xf9, 0x21, 255),
];

/// Named colormaps with evenly spaced anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    /// Diverging red-yellow-green.
    #[default]
    RdYlGn,
    Viridis,
    Plasma,
}

impl Colormap {
    /// Case-insensitive name lookup ("RdYlGn", "viridis", "plasma").
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "rdylgn" => Ok(Colormap::RdYlGn),
            "viridis" => Ok(Colormap::Viridis),
            "plasma" => Ok(Colormap::Plasma),
            other => Err(RenderError::invalid_parameter(
                "colormap",
                format!("unknown colormap '{}'", other),
            )),
        }
    }

    fn anchors(&self) -> &'static [Color] {
        match self {
            Colormap::RdYlGn => &RDYLGN,
            Colormap::Viridis => &VIRIDIS,
            Colormap::Plasma => &PLASMA,
        }
    }

    /// Color at `t` in [0, 1]; values outside are clamped.
    pub fn color_at(&self, t: f32) -> Color {
        let anchors = self.anchors();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (anchors.len() - 1) as f32;
        let lower = (scaled.floor() as usize).min(anchors.len() - 2);
        interpolate_color(anchors[lower], anchors[lower + 1], scaled - lower as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colormap_endpoints() {
        assert_eq!(Colormap::Viridis.color_at(0.0), VIRIDIS[0]);
        assert_eq!(Colormap::Viridis.color_at(1.0), VIRIDIS[4]);
        assert_eq!(Colormap::RdYlGn.color_at(0.5), RDYLGN[5]);
        assert_eq!(Colormap::Plasma.color_at(2.0), PLASMA[4]);
    }

    #[test]
    fn test_colormap_interpolates() {
        let c = Colormap::Viridis.color_at(0.125);
        // Halfway between the first two anchors
        assert_eq!(c, interpolate_color(VIRIDIS[0], VIRIDIS[1], 0.5));
    }

    #[test]
    fn test_parse() {
        assert_eq!(Colormap::parse("RdYlGn").unwrap(), Colormap::RdYlGn);
        assert_eq!(Colormap::parse("VIRIDIS").unwrap(), Colormap::Viridis);
        assert!(Colormap::parse("jet").is_err());
    }
}
