use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FareSource {
    Remote,
    /// Computed locally because the pricing service could not answer.
    Local,
}

impl FareSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            FareSource::Remote => "remote",
            FareSource::Local => "local",
        }
    }
}

/// A displayed fare together with the trip inputs it was priced for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FareQuote {
    pub fare: f64,
    pub surge_multiplier: f64,
    pub source: FareSource,
    pub distance_km: f64,
    pub duration_min: Option<f64>,
}

impl FareQuote {
    pub fn is_degraded(&self) -> bool {
        self.source == FareSource::Local
    }

    pub fn is_for(&self, distance_km: f64, duration_min: Option<f64>) -> bool {
        self.distance_km == distance_km && self.duration_min == duration_min
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FareRequest {
    pub distance_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<f64>,
}

/// Raw pricing response. Every field is optional so a partial body can be detected and
/// replaced by the local formula.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PricingResponse {
    #[serde(default)]
    pub fare: Option<f64>,
    #[serde(default)]
    pub surge_multiplier: Option<f64>,
}
