use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::rider::Registration;

/// Opaque bearer token issued to a rider or driver at registration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// A rider or driver identity together with the credential that authorizes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub credential: Credential,
}

impl Actor {
    pub fn new(id: impl Into<String>, credential: Credential) -> Self {
        Self {
            id: id.into(),
            credential,
        }
    }

    /// Fails with a precondition error naming `role` if the id or credential is blank.
    pub fn ensure_complete(&self, role: &str) -> Result<(), AppError> {
        if self.id.trim().is_empty() {
            return Err(AppError::Precondition(format!("{role} id is required")));
        }
        if self.credential.is_empty() {
            return Err(AppError::Precondition(format!(
                "{role} credential is required"
            )));
        }
        Ok(())
    }
}

impl From<Registration> for Actor {
    fn from(registration: Registration) -> Self {
        Self {
            id: registration.id,
            credential: registration.api_key,
        }
    }
}

/// Identities known to this client session. Passed explicitly into operations instead
/// of living in ambient globals.
#[derive(Debug, Clone, Default)]
pub struct Session {
    rider: Option<Actor>,
    driver: Option<Actor>,
    rider_credentials: HashMap<String, Credential>,
    driver_credentials: HashMap<String, Credential>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rider(&mut self, rider: Actor) {
        self.rider_credentials
            .insert(rider.id.clone(), rider.credential.clone());
        self.rider = Some(rider);
    }

    pub fn set_driver(&mut self, driver: Actor) {
        self.driver_credentials
            .insert(driver.id.clone(), driver.credential.clone());
        self.driver = Some(driver);
    }

    pub fn rider(&self) -> Option<&Actor> {
        self.rider.as_ref()
    }

    pub fn driver(&self) -> Option<&Actor> {
        self.driver.as_ref()
    }

    pub fn rider_actor(&self, rider_id: &str) -> Option<Actor> {
        self.rider_credentials
            .get(rider_id)
            .map(|credential| Actor::new(rider_id, credential.clone()))
    }

    pub fn driver_actor(&self, driver_id: &str) -> Option<Actor> {
        self.driver_credentials
            .get(driver_id)
            .map(|credential| Actor::new(driver_id, credential.clone()))
    }
}
