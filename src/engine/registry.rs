use std::sync::Arc;

use tracing::info;

use crate::engine::refresh::refresh_drivers;
use crate::error::AppError;
use crate::models::driver::{NewDriver, Vehicle};
use crate::models::rider::{DEFAULT_RIDER_RATING, NewRider};
use crate::session::{Actor, Session};
use crate::state::AppState;

/// Rider and driver registration.
pub struct Registry {
    state: Arc<AppState>,
}

impl Registry {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Creates a rider and makes it the session's active rider.
    pub async fn register_rider(
        &self,
        session: &mut Session,
        name: &str,
        phone: &str,
    ) -> Result<Actor, AppError> {
        let result = self.create_rider(name, phone).await;
        self.report("register_rider", &result);
        let rider = result?;

        session.set_rider(rider.clone());
        self.state.notify("Rider created");
        Ok(rider)
    }

    async fn create_rider(&self, name: &str, phone: &str) -> Result<Actor, AppError> {
        let name = required(name, "rider name")?;
        let phone = required(phone, "rider phone")?;

        let registration = self
            .state
            .service
            .create_rider(&NewRider {
                name,
                phone,
                rating: DEFAULT_RIDER_RATING,
            })
            .await?;

        info!(rider_id = %registration.id, "rider registered");
        Ok(registration.into())
    }

    /// Creates an available driver, remembers its credential and refreshes the driver
    /// list.
    pub async fn register_driver(
        &self,
        session: &mut Session,
        name: &str,
        phone: &str,
        vehicle: Vehicle,
    ) -> Result<Actor, AppError> {
        let result = self.create_driver(name, phone, vehicle).await;
        self.report("register_driver", &result);
        let driver = result?;

        session.set_driver(driver.clone());
        self.state.notify("Driver added");
        refresh_drivers(&self.state).await;
        Ok(driver)
    }

    async fn create_driver(
        &self,
        name: &str,
        phone: &str,
        vehicle: Vehicle,
    ) -> Result<Actor, AppError> {
        let new_driver = NewDriver {
            name: required(name, "driver name")?,
            phone: required(phone, "driver phone")?,
            vehicle: Vehicle {
                make: required(&vehicle.make, "vehicle make")?,
                model: required(&vehicle.model, "vehicle model")?,
                plate: required(&vehicle.plate, "vehicle plate")?,
                color: vehicle
                    .color
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty()),
            },
            is_available: true,
        };

        let registration = self.state.service.create_driver(&new_driver).await?;
        info!(driver_id = %registration.id, "driver registered");
        Ok(registration.into())
    }

    /// Adopts an identity created elsewhere.
    pub fn use_rider(&self, session: &mut Session, rider: Actor) -> Result<(), AppError> {
        rider.ensure_complete("rider")?;
        session.set_rider(rider);
        Ok(())
    }

    pub fn use_driver(&self, session: &mut Session, driver: Actor) -> Result<(), AppError> {
        driver.ensure_complete("driver")?;
        session.set_driver(driver);
        Ok(())
    }

    fn report<T>(&self, operation: &str, result: &Result<T, AppError>) {
        match result {
            Ok(_) => self.state.metrics.record_request(operation, "success"),
            Err(err) => {
                self.state
                    .metrics
                    .record_request(operation, err.outcome_label());
                self.state.notify_error(err.notification());
            }
        }
    }
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Precondition(format!("{field} is required")));
    }
    Ok(value.to_string())
}
