use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Result<Self, AppError> {
        let location = Self { lat, lng };
        if !location.is_valid() {
            return Err(AppError::Precondition(format!(
                "coordinates out of range: {lat}, {lng}"
            )));
        }
        Ok(location)
    }

    /// Parses a pair of free-text fields. Blank or non-numeric input is "incomplete".
    pub fn parse(lat: &str, lng: &str) -> Option<Self> {
        let lat = parse_measure(lat)?;
        let lng = parse_measure(lng)?;
        Self::new(lat, lng).ok()
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Lenient numeric parse for user-entered fields; anything that is not a finite number
/// yields `None`.
pub fn parse_measure(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Validates an optional location for an operation, naming the field on failure.
pub fn require_location(location: Option<Location>, field: &str) -> Result<Location, AppError> {
    match location {
        Some(location) if location.is_valid() => Ok(location),
        Some(location) => Err(AppError::Precondition(format!(
            "{field} coordinates out of range: {}, {}",
            location.lat, location.lng
        ))),
        None => Err(AppError::Precondition(format!(
            "{field} coordinates are required"
        ))),
    }
}
