use serde::{Deserialize, Serialize};

use crate::models::location::Location;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoSearchResult {
    pub display_name: String,
    pub lat: f64,
    pub lng: f64,
}

impl GeoSearchResult {
    pub fn location(&self) -> Location {
        Location {
            lat: self.lat,
            lng: self.lng,
        }
    }

    pub fn label(&self) -> String {
        format!("{} ({:.5}, {:.5})", self.display_name, self.lat, self.lng)
    }
}
