use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};

use crate::config::Config;
use crate::models::driver::Driver;
use crate::models::fare::FareQuote;
use crate::models::location::Location;
use crate::models::place::GeoSearchResult;
use crate::models::ride::Ride;
use crate::observability::metrics::Metrics;
use crate::remote::RemoteService;

/// Which driver set is on display. "Nearby" is a different set from "all", so switching
/// replaces the list rather than merging into it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriverScope {
    All,
    Nearby { origin: Location, radius_km: f64 },
}

#[derive(Debug, Clone)]
pub struct DriverView {
    pub scope: DriverScope,
    pub drivers: Arc<Vec<Driver>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Everything the surface displays. Each snapshot is replaced wholesale, never patched.
pub struct AppState {
    pub service: Arc<dyn RemoteService>,
    pub rides: watch::Sender<Arc<Vec<Ride>>>,
    pub drivers: watch::Sender<DriverView>,
    pub fare: watch::Sender<Option<FareQuote>>,
    pub search_results: watch::Sender<Arc<Vec<GeoSearchResult>>>,
    pub notifications: broadcast::Sender<Notification>,
    pub metrics: Metrics,
    notification_timeout: Duration,
}

impl AppState {
    pub fn new(service: Arc<dyn RemoteService>, config: &Config) -> Self {
        let (rides, _unused_rides_rx) = watch::channel(Arc::new(Vec::new()));
        let (drivers, _unused_drivers_rx) = watch::channel(DriverView {
            scope: DriverScope::All,
            drivers: Arc::new(Vec::new()),
        });
        let (fare, _unused_fare_rx) = watch::channel(None);
        let (search_results, _unused_search_rx) = watch::channel(Arc::new(Vec::new()));
        let (notifications, _unused_rx) = broadcast::channel(config.event_buffer_size);

        Self {
            service,
            rides,
            drivers,
            fare,
            search_results,
            notifications,
            metrics: Metrics::new(),
            notification_timeout: config.notification_timeout,
        }
    }

    pub fn rides_snapshot(&self) -> Arc<Vec<Ride>> {
        self.rides.borrow().clone()
    }

    pub fn drivers_snapshot(&self) -> DriverView {
        self.drivers.borrow().clone()
    }

    pub fn find_ride(&self, ride_id: &str) -> Option<Ride> {
        self.rides.borrow().iter().find(|ride| ride.id == ride_id).cloned()
    }

    pub fn notify(&self, message: impl Into<String>) {
        self.publish(NotificationLevel::Info, message.into());
    }

    pub fn notify_error(&self, message: impl Into<String>) {
        self.publish(NotificationLevel::Error, message.into());
    }

    fn publish(&self, level: NotificationLevel, message: String) {
        let issued_at = Utc::now();
        let expires_at = issued_at
            + chrono::Duration::from_std(self.notification_timeout)
                .unwrap_or_else(|_| chrono::Duration::seconds(3));
        // No subscriber is fine: notifications are transient.
        let _ = self.notifications.send(Notification {
            level,
            message,
            issued_at,
            expires_at,
        });
    }
}
