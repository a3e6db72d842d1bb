use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::fare::{FareQuote, FareRequest, FareSource};
use crate::models::location::parse_measure;
use crate::state::AppState;

pub const BASE_FARE: f64 = 2.0;
pub const PER_KM_RATE: f64 = 1.2;
pub const PER_MIN_RATE: f64 = 0.2;
pub const DEFAULT_SURGE: f64 = 1.0;

/// Rounds half up to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

/// Deterministic fare used whenever the pricing service cannot answer.
pub fn local_fare(distance_km: f64, duration_min: Option<f64>) -> FareQuote {
    let fare = BASE_FARE + PER_KM_RATE * distance_km + PER_MIN_RATE * duration_min.unwrap_or(0.0);
    FareQuote {
        fare: round2(fare),
        surge_multiplier: DEFAULT_SURGE,
        source: FareSource::Local,
        distance_km,
        duration_min,
    }
}

/// Produces the displayed fare. The latest result to arrive wins; nothing in flight is
/// cancelled.
#[derive(Clone)]
pub struct FareEstimator {
    state: Arc<AppState>,
}

impl FareEstimator {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// `None` clears the display: the distance is missing or not a usable number.
    pub async fn estimate(
        &self,
        distance_km: Option<f64>,
        duration_min: Option<f64>,
    ) -> Option<FareQuote> {
        let quote = match usable(distance_km) {
            Some(distance_km) => {
                let duration_min = usable(duration_min);
                Some(match self.remote_quote(distance_km, duration_min).await {
                    Ok(quote) => quote,
                    Err(err) => {
                        debug!(error = %err, "pricing unavailable; using local fare");
                        local_fare(distance_km, duration_min)
                    }
                })
            }
            None => None,
        };

        if let Some(quote) = &quote {
            self.state
                .metrics
                .fare_quotes_total
                .with_label_values(&[quote.source.as_str()])
                .inc();
        }
        self.state.fare.send_replace(quote);
        quote
    }

    /// Same as [`estimate`](Self::estimate) for raw form fields.
    pub async fn estimate_input(&self, distance: &str, duration: &str) -> Option<FareQuote> {
        self.estimate(parse_measure(distance), parse_measure(duration))
            .await
    }

    /// The fare for exactly these inputs: the displayed quote when it was priced for
    /// them, otherwise a fresh estimate awaited in place.
    pub async fn quote_for(
        &self,
        distance_km: Option<f64>,
        duration_min: Option<f64>,
    ) -> Option<FareQuote> {
        let distance = usable(distance_km)?;
        let duration = usable(duration_min);

        let shown = *self.state.fare.borrow();
        match shown {
            Some(quote) if quote.is_for(distance, duration) => Some(quote),
            _ => {
                debug!(distance_km = distance, "displayed fare is stale; re-estimating");
                self.estimate(Some(distance), duration).await
            }
        }
    }

    /// Re-estimates in the background after an input change.
    pub fn trigger(&self, distance_km: Option<f64>, duration_min: Option<f64>) -> JoinHandle<()> {
        let estimator = self.clone();
        tokio::spawn(async move {
            estimator.estimate(distance_km, duration_min).await;
        })
    }

    async fn remote_quote(
        &self,
        distance_km: f64,
        duration_min: Option<f64>,
    ) -> Result<FareQuote, AppError> {
        let response = self
            .state
            .service
            .estimate_fare(&FareRequest {
                distance_km,
                duration_min,
            })
            .await?;

        let fare = response
            .fare
            .filter(|fare| fare.is_finite() && *fare >= 0.0)
            .ok_or_else(|| {
                AppError::RemoteUnavailable("pricing response has no usable fare".to_string())
            })?;
        let surge_multiplier = match response.surge_multiplier {
            Some(surge) if surge.is_finite() && surge > 0.0 => surge,
            Some(surge) => {
                warn!(surge, "ignoring invalid surge multiplier");
                DEFAULT_SURGE
            }
            None => DEFAULT_SURGE,
        };

        Ok(FareQuote {
            fare: round2(fare),
            surge_multiplier,
            source: FareSource::Remote,
            distance_km,
            duration_min,
        })
    }
}

fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}
