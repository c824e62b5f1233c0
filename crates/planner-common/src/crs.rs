//! Coordinate Reference System identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A coordinate reference system identified by its EPSG code.
///
/// GeoTIFF stores CRS codes in 16-bit GeoKeys, so the code is a `u16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Crs {
    epsg: u16,
}

impl Crs {
    /// WGS84 geographic (lon/lat in degrees).
    pub const WGS84: Crs = Crs { epsg: 4326 };

    /// Web Mercator (meters). The display CRS for XYZ tiles.
    pub const WEB_MERCATOR: Crs = Crs { epsg: 3857 };

    pub const fn from_epsg(epsg: u16) -> Self {
        Self { epsg }
    }

    pub fn epsg(&self) -> u16 {
        self.epsg
    }

    pub fn is_web_mercator(&self) -> bool {
        // 900913 does not fit in a u16; 3857 and the old 3785 alias are both accepted.
        self.epsg == 3857 || self.epsg == 3785
    }

    pub fn is_wgs84(&self) -> bool {
        self.epsg == 4326
    }

    /// Parse "EPSG:3857", "epsg:3857" or a bare "3857".
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let trimmed = s.trim();
        let upper = trimmed.to_uppercase();
        let code = upper.strip_prefix("EPSG:").unwrap_or(&upper);
        if upper == "CRS:84" {
            return Ok(Crs::WGS84);
        }
        code.parse::<u16>()
            .ok()
            .filter(|c| *c != 0)
            .map(Crs::from_epsg)
            .ok_or_else(|| CrsParseError::UnsupportedCrs(trimmed.to_string()))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl FromStr for Crs {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Crs::parse(s)
    }
}

impl TryFrom<String> for Crs {
    type Error = CrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Crs::parse(&value)
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        assert_eq!(Crs::parse("EPSG:3857").unwrap(), Crs::WEB_MERCATOR);
        assert_eq!(Crs::parse("epsg:4326").unwrap(), Crs::WGS84);
        assert_eq!(Crs::parse("32633").unwrap().epsg(), 32633);
        assert_eq!(Crs::parse("CRS:84").unwrap(), Crs::WGS84);
        assert!(Crs::parse("EPSG:abc").is_err());
        assert!(Crs::parse("0").is_err());
    }

    #[test]
    fn test_display_and_serde() {
        assert_eq!(Crs::WEB_MERCATOR.to_string(), "EPSG:3857");
        let json = serde_json::to_string(&Crs::WGS84).unwrap();
        assert_eq!(json, "\"EPSG:4326\"");
        let back: Crs = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Crs::WGS84);
    }
}
