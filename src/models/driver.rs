use serde::{Deserialize, Serialize};

use crate::models::location::Location;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub make: String,
    pub model: String,
    pub plate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub phone: String,
    pub vehicle: Vehicle,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(default)]
    pub location: Option<Location>,
}

fn default_available() -> bool {
    true
}

impl Driver {
    pub fn vehicle_label(&self) -> String {
        format!(
            "{} {} • {}",
            self.vehicle.make, self.vehicle.model, self.vehicle.plate
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewDriver {
    pub name: String,
    pub phone: String,
    pub vehicle: Vehicle,
    pub is_available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationUpdate {
    Recorded,
    /// The service already held this position.
    Unchanged,
}
