use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::RemoteService;
use crate::error::AppError;
use crate::models::driver::{Driver, LocationUpdate, NewDriver};
use crate::models::fare::{FareRequest, PricingResponse};
use crate::models::location::Location;
use crate::models::place::GeoSearchResult;
use crate::models::ride::{NewRide, Ride, RidePatch, RideStatus};
use crate::models::rider::{NewRider, Registration};
use crate::session::Credential;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Pricing {
    Quote { fare: f64, surge: f64 },
    MissingFare,
    Down,
}

#[derive(Default)]
struct Inner {
    calls: Vec<String>,
    next_id: u64,
    rider_keys: HashMap<String, String>,
    driver_keys: HashMap<String, String>,
    drivers: Vec<Driver>,
    rides: Vec<Ride>,
    nearby: Vec<Driver>,
    searches: HashMap<String, (Duration, Vec<GeoSearchResult>)>,
    lists_down: bool,
    list_delay: Duration,
}

/// In-memory stand-in for the ride service that enforces the same actor rules.
pub(crate) struct FakeService {
    inner: Mutex<Inner>,
    pricing: Mutex<Pricing>,
}

impl FakeService {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            pricing: Mutex::new(Pricing::Down),
        }
    }

    fn inner(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.inner().calls.clone()
    }

    pub(crate) fn set_pricing(&self, pricing: Pricing) {
        *self.pricing.lock().unwrap() = pricing;
    }

    pub(crate) fn set_lists_down(&self, down: bool) {
        self.inner().lists_down = down;
    }

    pub(crate) fn set_list_delay(&self, delay: Duration) {
        self.inner().list_delay = delay;
    }

    pub(crate) fn set_nearby(&self, drivers: Vec<Driver>) {
        self.inner().nearby = drivers;
    }

    pub(crate) fn add_search(&self, query: &str, delay: Duration, names: &[&str]) {
        let results = names
            .iter()
            .enumerate()
            .map(|(i, name)| GeoSearchResult {
                display_name: name.to_string(),
                lat: 12.9 + i as f64 * 0.01,
                lng: 77.5,
            })
            .collect();
        self.inner()
            .searches
            .insert(query.to_string(), (delay, results));
    }

    pub(crate) fn insert_ride(&self, ride: Ride) {
        self.inner().rides.push(ride);
    }

    pub(crate) fn ride(&self, id: &str) -> Option<Ride> {
        self.inner().rides.iter().find(|r| r.id == id).cloned()
    }

    fn record(&self, call: impl Into<String>) {
        self.inner().calls.push(call.into());
    }
}

fn forbidden(message: &str) -> AppError {
    AppError::Rejected {
        status: 403,
        message: message.to_string(),
    }
}

fn conflict(message: &str) -> AppError {
    AppError::Rejected {
        status: 409,
        message: message.to_string(),
    }
}

#[async_trait]
impl RemoteService for FakeService {
    async fn create_rider(&self, _rider: &NewRider) -> Result<Registration, AppError> {
        self.record("create_rider");
        let mut inner = self.inner();
        inner.next_id += 1;
        let id = format!("rider-{}", inner.next_id);
        let key = format!("rk-{}", inner.next_id);
        inner.rider_keys.insert(id.clone(), key.clone());
        Ok(Registration {
            id,
            api_key: Credential::new(key),
        })
    }

    async fn create_driver(&self, driver: &NewDriver) -> Result<Registration, AppError> {
        self.record("create_driver");
        let mut inner = self.inner();
        inner.next_id += 1;
        let id = format!("driver-{}", inner.next_id);
        let key = format!("dk-{}", inner.next_id);
        inner.driver_keys.insert(id.clone(), key.clone());
        inner.drivers.push(Driver {
            id: id.clone(),
            name: driver.name.clone(),
            phone: driver.phone.clone(),
            vehicle: driver.vehicle.clone(),
            is_available: driver.is_available,
            location: None,
        });
        Ok(Registration {
            id,
            api_key: Credential::new(key),
        })
    }

    async fn list_drivers(&self) -> Result<Vec<Driver>, AppError> {
        self.record("list_drivers");
        let delay = self.inner().list_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let inner = self.inner();
        if inner.lists_down {
            return Err(AppError::RemoteUnavailable("connection refused".to_string()));
        }
        Ok(inner.drivers.clone())
    }

    async fn nearby_drivers(
        &self,
        _origin: Location,
        _radius_km: f64,
    ) -> Result<Vec<Driver>, AppError> {
        self.record("nearby_drivers");
        let inner = self.inner();
        if inner.lists_down {
            return Err(AppError::RemoteUnavailable("connection refused".to_string()));
        }
        Ok(inner.nearby.clone())
    }

    async fn update_driver_location(
        &self,
        driver_id: &str,
        credential: &Credential,
        location: Location,
    ) -> Result<LocationUpdate, AppError> {
        self.record("update_driver_location");
        let mut inner = self.inner();
        if inner.driver_keys.get(driver_id).map(String::as_str) != Some(credential.expose()) {
            return Err(forbidden("not this driver"));
        }
        let driver = inner
            .drivers
            .iter_mut()
            .find(|d| d.id == driver_id)
            .ok_or_else(|| AppError::Rejected {
                status: 404,
                message: "driver not found".to_string(),
            })?;
        if driver.location == Some(location) {
            return Ok(LocationUpdate::Unchanged);
        }
        driver.location = Some(location);
        Ok(LocationUpdate::Recorded)
    }

    async fn list_rides(&self) -> Result<Vec<Ride>, AppError> {
        self.record("list_rides");
        let inner = self.inner();
        if inner.lists_down {
            return Err(AppError::RemoteUnavailable("connection refused".to_string()));
        }
        Ok(inner.rides.clone())
    }

    async fn create_ride(
        &self,
        credential: &Credential,
        ride: &NewRide,
    ) -> Result<Ride, AppError> {
        self.record("create_ride");
        let mut inner = self.inner();
        if inner.rider_keys.get(&ride.rider_id).map(String::as_str) != Some(credential.expose()) {
            return Err(forbidden("not this rider"));
        }
        inner.next_id += 1;
        let created = Ride {
            id: format!("ride-{}", inner.next_id),
            rider_id: ride.rider_id.clone(),
            driver_id: None,
            pickup: ride.pickup,
            dropoff: ride.dropoff,
            distance_km: ride.distance_km,
            duration_min: ride.duration_min,
            fare_estimate: ride.fare_estimate,
            status: RideStatus::Requested,
        };
        inner.rides.push(created.clone());
        Ok(created)
    }

    async fn update_ride(
        &self,
        ride_id: &str,
        credential: &Credential,
        patch: &RidePatch,
    ) -> Result<Ride, AppError> {
        self.record(format!("update_ride:{}", patch.status));
        let mut guard = self.inner();
        let inner = &mut *guard;
        let ride = inner
            .rides
            .iter_mut()
            .find(|r| r.id == ride_id)
            .ok_or_else(|| AppError::Rejected {
                status: 404,
                message: "ride not found".to_string(),
            })?;

        if !ride.status.can_transition_to(patch.status) {
            return Err(conflict("invalid transition"));
        }

        let key_of = |keys: &HashMap<String, String>, id: Option<&String>| {
            id.and_then(|id| keys.get(id)).cloned()
        };
        let expected = match patch.status {
            RideStatus::Cancelled => key_of(&inner.rider_keys, Some(&ride.rider_id)),
            RideStatus::Assigned => key_of(&inner.driver_keys, patch.driver_id.as_ref()),
            _ => key_of(&inner.driver_keys, ride.driver_id.as_ref()),
        };
        if expected.as_deref() != Some(credential.expose()) {
            return Err(forbidden("wrong actor"));
        }

        if patch.status == RideStatus::Assigned {
            ride.driver_id = patch.driver_id.clone();
        }
        ride.status = patch.status;
        Ok(ride.clone())
    }

    async fn estimate_fare(&self, _request: &FareRequest) -> Result<PricingResponse, AppError> {
        self.record("estimate_fare");
        let pricing = *self.pricing.lock().unwrap();
        match pricing {
            Pricing::Quote { fare, surge } => Ok(PricingResponse {
                fare: Some(fare),
                surge_multiplier: Some(surge),
            }),
            Pricing::MissingFare => Ok(PricingResponse {
                fare: None,
                surge_multiplier: Some(1.4),
            }),
            Pricing::Down => Err(AppError::RemoteUnavailable("pricing down".to_string())),
        }
    }

    async fn search_places(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<GeoSearchResult>, AppError> {
        self.record(format!("search:{query}"));
        let entry = self.inner().searches.get(query).cloned();
        let Some((delay, mut results)) = entry else {
            return Err(AppError::RemoteUnavailable("no such place".to_string()));
        };
        tokio::time::sleep(delay).await;
        self.record(format!("search_done:{query}"));
        results.truncate(limit);
        Ok(results)
    }
}
