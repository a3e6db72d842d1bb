use std::sync::Arc;

use tracing::{info, warn};

use crate::engine::refresh::refresh_rides;
use crate::error::AppError;
use crate::models::location::{Location, require_location};
use crate::models::ride::{NewRide, Ride, RidePatch, RideStatus};
use crate::session::{Actor, Session};
use crate::state::AppState;

/// Inputs gathered by the surface for a new ride.
#[derive(Debug, Clone, Default)]
pub struct RideRequest {
    pub pickup: Option<Location>,
    pub dropoff: Option<Location>,
    pub distance_km: Option<f64>,
    pub duration_min: Option<f64>,
    pub fare_estimate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Applied(Ride),
    /// The ride was already terminal; nothing was sent.
    Unchanged(RideStatus),
}

/// Owns ride status transitions. Displayed state is only ever changed by a refresh
/// after the service confirms a transition.
pub struct RideLifecycle {
    state: Arc<AppState>,
}

impl RideLifecycle {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub async fn request_ride(
        &self,
        session: &Session,
        request: RideRequest,
    ) -> Result<Ride, AppError> {
        let result = self.create_ride(session, request).await;
        self.finish("request_ride", &result, "Ride requested").await;
        result
    }

    async fn create_ride(&self, session: &Session, request: RideRequest) -> Result<Ride, AppError> {
        let rider = session
            .rider()
            .ok_or_else(|| AppError::Precondition("Create or set a rider first".to_string()))?;
        rider.ensure_complete("rider")?;

        let new_ride = NewRide {
            rider_id: rider.id.clone(),
            pickup: require_location(request.pickup, "pickup")?,
            dropoff: require_location(request.dropoff, "dropoff")?,
            distance_km: non_negative(request.distance_km, "distance")?,
            duration_min: non_negative(request.duration_min, "duration")?,
            fare_estimate: non_negative(request.fare_estimate, "fare estimate")?
                .map(crate::engine::fare::round2),
            status: RideStatus::Requested,
        };

        let ride = self
            .state
            .service
            .create_ride(&rider.credential, &new_ride)
            .await?;

        if ride.status != RideStatus::Requested || ride.driver_id.is_some() {
            warn!(ride_id = %ride.id, status = %ride.status, "new ride is not a bare request");
        }
        info!(ride_id = %ride.id, rider_id = %ride.rider_id, "ride requested");
        Ok(ride)
    }

    /// Asks the service to give `ride_id` to `driver`. The service decides whether the
    /// ride is still open.
    pub async fn assign_driver(&self, ride_id: &str, driver: &Actor) -> Result<Ride, AppError> {
        let result = self.submit_assignment(ride_id, driver).await;
        self.finish("assign_driver", &result, "Driver assigned").await;
        result
    }

    async fn submit_assignment(&self, ride_id: &str, driver: &Actor) -> Result<Ride, AppError> {
        if ride_id.trim().is_empty() {
            return Err(AppError::Precondition("ride id is required".to_string()));
        }
        driver.ensure_complete("driver")?;

        let patch = RidePatch {
            driver_id: Some(driver.id.clone()),
            status: RideStatus::Assigned,
        };
        let ride = self
            .state
            .service
            .update_ride(ride_id, &driver.credential, &patch)
            .await
            .map_err(AppError::into_transition_error)?;

        info!(ride_id = %ride.id, driver_id = %driver.id, "driver assigned");
        Ok(ride)
    }

    /// Moves `ride` one step along the successor table, or to `cancelled` when that is
    /// the explicit target. Terminal rides are left alone.
    pub async fn advance(
        &self,
        session: &Session,
        ride: &Ride,
        explicit_target: Option<RideStatus>,
    ) -> Result<TransitionOutcome, AppError> {
        let result = self.submit_transition(session, ride, explicit_target).await;

        match &result {
            Ok(TransitionOutcome::Unchanged(status)) => {
                self.state
                    .metrics
                    .record_request("advance", "unchanged");
                self.state.notify(format!("Ride already {status}"));
            }
            Ok(TransitionOutcome::Applied(updated)) => {
                self.succeed("advance", &format!("Ride status → {}", updated.status))
                    .await;
            }
            Err(err) => self.fail("advance", err),
        }
        result
    }

    pub async fn cancel(
        &self,
        session: &Session,
        ride: &Ride,
    ) -> Result<TransitionOutcome, AppError> {
        self.advance(session, ride, Some(RideStatus::Cancelled)).await
    }

    async fn submit_transition(
        &self,
        session: &Session,
        ride: &Ride,
        explicit_target: Option<RideStatus>,
    ) -> Result<TransitionOutcome, AppError> {
        let target = match explicit_target {
            None => ride.status.successor(),
            Some(RideStatus::Cancelled) => RideStatus::Cancelled,
            Some(other) => {
                return Err(AppError::Precondition(format!(
                    "{other} can only be reached by advancing"
                )));
            }
        };

        if ride.status.is_terminal() {
            return Ok(TransitionOutcome::Unchanged(ride.status));
        }
        if !ride.status.can_transition_to(target) {
            return Err(AppError::Precondition(format!(
                "a {} ride cannot move to {target}",
                ride.status
            )));
        }

        let actor = match target {
            RideStatus::Cancelled => session.rider_actor(&ride.rider_id).ok_or_else(|| {
                AppError::Precondition("only the ride's rider can cancel it".to_string())
            })?,
            RideStatus::Assigned => {
                return Err(AppError::Precondition(
                    "assign a driver to this ride first".to_string(),
                ));
            }
            _ => {
                let driver_id = ride.driver_id.as_deref().ok_or_else(|| {
                    AppError::Precondition("ride has no driver".to_string())
                })?;
                session.driver_actor(driver_id).ok_or_else(|| {
                    AppError::Precondition(
                        "only the assigned driver can progress this ride".to_string(),
                    )
                })?
            }
        };

        let patch = RidePatch {
            driver_id: None,
            status: target,
        };
        let updated = self
            .state
            .service
            .update_ride(&ride.id, &actor.credential, &patch)
            .await
            .map_err(AppError::into_transition_error)?;

        info!(ride_id = %ride.id, from = %ride.status, to = %updated.status, "ride transitioned");
        Ok(TransitionOutcome::Applied(updated))
    }

    async fn finish<T>(&self, operation: &str, result: &Result<T, AppError>, success: &str) {
        match result {
            Ok(_) => self.succeed(operation, success).await,
            Err(err) => self.fail(operation, err),
        }
    }

    async fn succeed(&self, operation: &str, message: &str) {
        self.state.metrics.record_request(operation, "success");
        self.state.notify(message);
        refresh_rides(&self.state).await;
    }

    fn fail(&self, operation: &str, err: &AppError) {
        warn!(operation, error = %err, "ride operation failed");
        self.state
            .metrics
            .record_request(operation, err.outcome_label());
        self.state.notify_error(err.notification());
    }
}

fn non_negative(value: Option<f64>, field: &str) -> Result<Option<f64>, AppError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(AppError::Precondition(format!(
            "{field} must be a non-negative number"
        ))),
        other => Ok(other),
    }
}
