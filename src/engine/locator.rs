use std::sync::Arc;

use tracing::{info, warn};

use crate::error::AppError;
use crate::geo::sort_by_distance;
use crate::models::driver::{Driver, LocationUpdate};
use crate::models::location::{Location, require_location};
use crate::session::Actor;
use crate::state::{AppState, DriverScope, DriverView};

pub struct DriverLocator {
    state: Arc<AppState>,
}

impl DriverLocator {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Replaces the displayed driver set with drivers within `radius_km` of `origin`,
    /// nearest first. A failed read keeps the current list.
    pub async fn find_nearby(
        &self,
        origin: Option<Location>,
        radius_km: f64,
    ) -> Result<Arc<Vec<Driver>>, AppError> {
        let origin = require_location(origin, "origin")?;
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(AppError::Precondition(
                "radius must be a positive number of km".to_string(),
            ));
        }

        let mut drivers = match self.state.service.nearby_drivers(origin, radius_km).await {
            Ok(drivers) => drivers,
            Err(err) => {
                warn!(error = %err, "nearby lookup failed; keeping current drivers");
                self.state
                    .metrics
                    .record_request("find_nearby", err.outcome_label());
                return Err(err);
            }
        };
        sort_by_distance(&mut drivers, &origin);

        let drivers = Arc::new(drivers);
        self.state.drivers.send_replace(DriverView {
            scope: DriverScope::Nearby { origin, radius_km },
            drivers: Arc::clone(&drivers),
        });
        self.state.metrics.record_request("find_nearby", "success");
        info!(count = drivers.len(), radius_km, "nearby drivers displayed");
        Ok(drivers)
    }

    /// Switches the display back to the full driver list.
    pub async fn show_all(&self) -> bool {
        self.state
            .drivers
            .send_modify(|view| view.scope = DriverScope::All);
        crate::engine::refresh::refresh_drivers(&self.state).await
    }

    /// Records the driver's own position. The service only lets a driver move itself.
    pub async fn update_location(
        &self,
        driver: Option<&Actor>,
        location: Option<Location>,
    ) -> Result<LocationUpdate, AppError> {
        let result = self.submit_location(driver, location).await;

        match &result {
            Ok(LocationUpdate::Recorded) => {
                self.state
                    .metrics
                    .record_request("update_location", "success");
                self.state.notify("Location updated");
            }
            Ok(LocationUpdate::Unchanged) => {
                self.state
                    .metrics
                    .record_request("update_location", "unchanged");
                self.state.notify("Location unchanged");
            }
            Err(err) => {
                warn!(error = %err, "location update failed");
                self.state
                    .metrics
                    .record_request("update_location", err.outcome_label());
                self.state.notify_error(err.notification());
            }
        }
        result
    }

    async fn submit_location(
        &self,
        driver: Option<&Actor>,
        location: Option<Location>,
    ) -> Result<LocationUpdate, AppError> {
        let driver = driver
            .ok_or_else(|| AppError::Precondition("Create or set a driver first".to_string()))?;
        driver.ensure_complete("driver")?;
        let location = require_location(location, "driver")?;

        let outcome = self
            .state
            .service
            .update_driver_location(&driver.id, &driver.credential, location)
            .await?;
        info!(driver_id = %driver.id, ?outcome, "driver location submitted");
        Ok(outcome)
    }
}
