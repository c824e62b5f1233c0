//! Waypoint records.

use serde::{Deserialize, Serialize};

/// A stored waypoint. Rows are append-only and keyed by an auto-incrementing id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub description: Option<String>,
}

/// Payload for creating a waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWaypoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewWaypoint {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check coordinate ranges before the waypoint reaches the store.
    pub fn validate(&self) -> Result<(), String> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude {} is outside [-90, 90]", self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("longitude {} is outside [-180, 180]", self.longitude));
        }
        Ok(())
    }
}

impl Waypoint {
    /// Planar position used for route ordering: (x = longitude, y = latitude).
    pub fn position(&self) -> (f64, f64) {
        (self.longitude, self.latitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_is_optional_in_json() {
        let wp: NewWaypoint =
            serde_json::from_str(r#"{"name":"A","latitude":1.5,"longitude":2.5}"#).unwrap();
        assert_eq!(wp.description, None);
        assert!(wp.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(NewWaypoint::new("bad", 91.0, 0.0).validate().is_err());
        assert!(NewWaypoint::new("bad", 0.0, -181.0).validate().is_err());
        assert!(NewWaypoint::new("bad", f64::NAN, 0.0).validate().is_err());
    }
}
