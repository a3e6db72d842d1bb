use serde::{Deserialize, Serialize};

use crate::session::Credential;

pub const DEFAULT_RIDER_RATING: f64 = 5.0;

#[derive(Debug, Clone, Serialize)]
pub struct NewRider {
    pub name: String,
    pub phone: String,
    pub rating: f64,
}

/// Identity issued by the service when a rider or driver is created.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    #[serde(alias = "_id")]
    pub id: String,
    pub api_key: Credential,
}
