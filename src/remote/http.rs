use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use super::{CREDENTIAL_HEADER, REQUEST_ID_HEADER, RemoteService};
use crate::error::AppError;
use crate::models::driver::{Driver, LocationUpdate, NewDriver};
use crate::models::fare::{FareRequest, PricingResponse};
use crate::models::location::Location;
use crate::models::place::GeoSearchResult;
use crate::models::ride::{NewRide, Ride, RidePatch};
use crate::models::rider::{NewRider, Registration};
use crate::session::Credential;

/// JSON-over-HTTP client for the ride service.
#[derive(Debug, Clone)]
pub struct HttpServiceClient {
    client: Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct LocationUpdateResponse {
    updated: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Option<Vec<GeoSearchResult>>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "detail", alias = "message")]
    error: String,
}

impl HttpServiceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|err| AppError::Config(format!("invalid backend url {base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!(
                "backend url {base_url} cannot carry a path"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Config(format!("failed to build http client: {err}")))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("backend url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn mutating(&self, builder: RequestBuilder, credential: Option<&Credential>) -> RequestBuilder {
        let request_id = Uuid::new_v4();
        debug!(request_id = %request_id, authorized = credential.is_some(), "mutating request");

        let builder = builder.header(REQUEST_ID_HEADER, request_id.to_string());
        match credential {
            Some(credential) => builder.header(CREDENTIAL_HEADER, credential.expose()),
            None => builder,
        }
    }
}

async fn send(builder: RequestBuilder) -> Result<Response, AppError> {
    builder
        .send()
        .await
        .map_err(|err| AppError::RemoteUnavailable(err.to_string()))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let status = response.status();

    if status.is_client_error() {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .ok()
            .filter(|msg| !msg.is_empty())
            .or_else(|| Some(text.trim().to_string()).filter(|msg| !msg.is_empty()))
            .unwrap_or_else(|| status.to_string());
        return Err(AppError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    if !status.is_success() {
        return Err(AppError::RemoteUnavailable(format!("HTTP {status}")));
    }

    response
        .json::<T>()
        .await
        .map_err(|err| AppError::RemoteUnavailable(format!("malformed response: {err}")))
}

#[async_trait]
impl RemoteService for HttpServiceClient {
    async fn create_rider(&self, rider: &NewRider) -> Result<Registration, AppError> {
        let url = self.endpoint(&["riders"])?;
        let response = send(self.mutating(self.client.post(url).json(rider), None)).await?;
        decode(response).await
    }

    async fn create_driver(&self, driver: &NewDriver) -> Result<Registration, AppError> {
        let url = self.endpoint(&["drivers"])?;
        let response = send(self.mutating(self.client.post(url).json(driver), None)).await?;
        decode(response).await
    }

    async fn list_drivers(&self) -> Result<Vec<Driver>, AppError> {
        let url = self.endpoint(&["drivers"])?;
        decode(send(self.client.get(url)).await?).await
    }

    async fn nearby_drivers(
        &self,
        origin: Location,
        radius_km: f64,
    ) -> Result<Vec<Driver>, AppError> {
        let url = self.endpoint(&["drivers", "nearby"])?;
        let request = self.client.get(url).query(&[
            ("lat", origin.lat.to_string()),
            ("lng", origin.lng.to_string()),
            ("radius_km", radius_km.to_string()),
        ]);
        decode(send(request).await?).await
    }

    async fn update_driver_location(
        &self,
        driver_id: &str,
        credential: &Credential,
        location: Location,
    ) -> Result<LocationUpdate, AppError> {
        let url = self.endpoint(&["drivers", driver_id, "location"])?;
        let request = self.mutating(self.client.patch(url).json(&location), Some(credential));
        let body: LocationUpdateResponse = decode(send(request).await?).await?;

        Ok(if body.updated {
            LocationUpdate::Recorded
        } else {
            LocationUpdate::Unchanged
        })
    }

    async fn list_rides(&self) -> Result<Vec<Ride>, AppError> {
        let url = self.endpoint(&["rides"])?;
        decode(send(self.client.get(url)).await?).await
    }

    async fn create_ride(
        &self,
        credential: &Credential,
        ride: &NewRide,
    ) -> Result<Ride, AppError> {
        let url = self.endpoint(&["rides"])?;
        let request = self.mutating(self.client.post(url).json(ride), Some(credential));
        decode(send(request).await?).await
    }

    async fn update_ride(
        &self,
        ride_id: &str,
        credential: &Credential,
        patch: &RidePatch,
    ) -> Result<Ride, AppError> {
        let url = self.endpoint(&["rides", ride_id])?;
        let request = self.mutating(self.client.patch(url).json(patch), Some(credential));
        decode(send(request).await?).await
    }

    async fn estimate_fare(&self, request: &FareRequest) -> Result<PricingResponse, AppError> {
        let url = self.endpoint(&["pricing", "estimate"])?;
        decode(send(self.client.post(url).json(request)).await?).await
    }

    async fn search_places(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<GeoSearchResult>, AppError> {
        let url = self.endpoint(&["geo", "search"])?;
        let request = self
            .client
            .get(url)
            .query(&[("q", query.to_string()), ("limit", limit.to_string())]);
        let body: SearchResponse = decode(send(request).await?).await?;

        let mut results = body.results.ok_or_else(|| {
            AppError::RemoteUnavailable("search response has no results list".to_string())
        })?;
        results.truncate(limit);
        Ok(results)
    }
}
