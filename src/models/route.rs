use crate::geo::haversine_km;
use crate::models::location::Location;
use crate::models::ride::Ride;

/// A path to overlay on the map. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    points: Vec<Location>,
}

impl RoutePath {
    /// Returns `None` for an empty path, which renders nothing.
    pub fn new(points: Vec<Location>) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(Self { points })
    }

    /// Straight segment from pickup to dropoff; no road routing is attempted.
    pub fn for_ride(ride: &Ride) -> Self {
        Self {
            points: vec![ride.pickup, ride.dropoff],
        }
    }

    pub fn positions(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|p| [p.lat, p.lng]).collect()
    }

    pub fn length_km(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| haversine_km(&pair[0], &pair[1]))
            .sum()
    }
}
