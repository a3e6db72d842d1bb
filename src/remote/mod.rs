pub mod http;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::driver::{Driver, LocationUpdate, NewDriver};
use crate::models::fare::{FareRequest, PricingResponse};
use crate::models::location::Location;
use crate::models::place::GeoSearchResult;
use crate::models::ride::{NewRide, Ride, RidePatch};
use crate::models::rider::{NewRider, Registration};
use crate::session::Credential;

pub use http::HttpServiceClient;

/// Header carrying the per-actor credential on mutating calls.
pub const CREDENTIAL_HEADER: &str = "x-api-key";
/// Correlation id attached to every mutating call.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Typed calls against the ride service. No business rules live here.
#[async_trait]
pub trait RemoteService: Send + Sync {
    async fn create_rider(&self, rider: &NewRider) -> Result<Registration, AppError>;

    async fn create_driver(&self, driver: &NewDriver) -> Result<Registration, AppError>;

    async fn list_drivers(&self) -> Result<Vec<Driver>, AppError>;

    async fn nearby_drivers(
        &self,
        origin: Location,
        radius_km: f64,
    ) -> Result<Vec<Driver>, AppError>;

    async fn update_driver_location(
        &self,
        driver_id: &str,
        credential: &Credential,
        location: Location,
    ) -> Result<LocationUpdate, AppError>;

    async fn list_rides(&self) -> Result<Vec<Ride>, AppError>;

    async fn create_ride(&self, credential: &Credential, ride: &NewRide)
    -> Result<Ride, AppError>;

    async fn update_ride(
        &self,
        ride_id: &str,
        credential: &Credential,
        patch: &RidePatch,
    ) -> Result<Ride, AppError>;

    async fn estimate_fare(&self, request: &FareRequest) -> Result<PricingResponse, AppError>;

    async fn search_places(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<GeoSearchResult>, AppError>;
}
