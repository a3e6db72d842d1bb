use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Requested,
    Assigned,
    Ongoing,
    Completed,
    Cancelled,
}

impl RideStatus {
    /// Fixed successor table. Terminal states map to themselves.
    pub const fn successor(self) -> RideStatus {
        match self {
            RideStatus::Requested => RideStatus::Assigned,
            RideStatus::Assigned => RideStatus::Ongoing,
            RideStatus::Ongoing => RideStatus::Completed,
            RideStatus::Completed => RideStatus::Completed,
            RideStatus::Cancelled => RideStatus::Cancelled,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }

    pub fn can_transition_to(self, target: RideStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        target == RideStatus::Cancelled || target == self.successor()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            RideStatus::Requested => "requested",
            RideStatus::Assigned => "assigned",
            RideStatus::Ongoing => "ongoing",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    #[serde(alias = "_id")]
    pub id: String,
    pub rider_id: String,
    #[serde(default)]
    pub driver_id: Option<String>,
    pub pickup: Location,
    pub dropoff: Location,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub duration_min: Option<f64>,
    #[serde(default)]
    pub fare_estimate: Option<f64>,
    pub status: RideStatus,
}

impl Ride {
    /// A ride has no driver exactly while it is still `requested`.
    pub fn is_consistent(&self) -> bool {
        self.driver_id.is_none() == (self.status == RideStatus::Requested)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewRide {
    pub rider_id: String,
    pub pickup: Location,
    pub dropoff: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fare_estimate: Option<f64>,
    pub status: RideStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    pub status: RideStatus,
}
