use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::config::Config;
use crate::engine::fare::FareEstimator;
use crate::engine::geosearch::GeosearchResolver;
use crate::engine::lifecycle::{RideLifecycle, RideRequest};
use crate::engine::locator::DriverLocator;
use crate::engine::refresh::refresh_all;
use crate::engine::registry::Registry;
use crate::error::AppError;
use crate::models::driver::{Driver, Vehicle};
use crate::models::fare::FareQuote;
use crate::models::location::{Location, parse_measure};
use crate::models::place::GeoSearchResult;
use crate::models::ride::Ride;
use crate::models::route::RoutePath;
use crate::session::{Actor, Credential, Session};
use crate::state::{AppState, DriverScope, Notification, NotificationLevel};
use crate::surface::intent::{Endpoint, HELP, Intent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Silent,
    Quit,
}

/// Ride form fields as entered. Endpoints that fail to parse are held as incomplete.
#[derive(Debug, Clone, Default)]
pub struct RideDraft {
    pub pickup: Option<Location>,
    pub dropoff: Option<Location>,
    pub distance: String,
    pub duration: String,
}

/// Line-oriented presentation surface: turns intents into engine calls and renders
/// snapshots as text.
pub struct Console {
    state: Arc<AppState>,
    session: Session,
    draft: RideDraft,
    registry: Registry,
    lifecycle: RideLifecycle,
    fare: FareEstimator,
    search: GeosearchResolver,
    locator: DriverLocator,
}

impl Console {
    pub fn new(state: Arc<AppState>, config: &Config) -> Self {
        Self {
            session: Session::new(),
            draft: RideDraft::default(),
            registry: Registry::new(Arc::clone(&state)),
            lifecycle: RideLifecycle::new(Arc::clone(&state)),
            fare: FareEstimator::new(Arc::clone(&state)),
            search: GeosearchResolver::new(
                Arc::clone(&state),
                config.search_debounce,
                config.search_limit,
            ),
            locator: DriverLocator::new(Arc::clone(&state)),
            state,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn draft(&self) -> &RideDraft {
        &self.draft
    }

    pub async fn handle_line(&mut self, line: &str) -> Reply {
        if line.trim().is_empty() {
            return Reply::Silent;
        }
        match Intent::parse(line) {
            Ok(intent) => self.handle(intent).await,
            Err(err) => {
                self.state.notify_error(err.notification());
                Reply::Silent
            }
        }
    }

    /// Operation failures are already reported as notifications by the engine, so they
    /// are dropped here.
    pub async fn handle(&mut self, intent: Intent) -> Reply {
        match intent {
            Intent::CreateRider { name, phone } => {
                let _ = self
                    .registry
                    .register_rider(&mut self.session, &name, &phone)
                    .await;
                self.whoami()
            }
            Intent::UseRider { id, credential } => {
                let rider = Actor::new(id, Credential::new(credential));
                self.adopt(|registry, session| registry.use_rider(session, rider))
            }
            Intent::CreateDriver {
                name,
                phone,
                make,
                model,
                plate,
                color,
            } => {
                let vehicle = Vehicle {
                    make,
                    model,
                    plate,
                    color,
                };
                let _ = self
                    .registry
                    .register_driver(&mut self.session, &name, &phone, vehicle)
                    .await;
                self.whoami()
            }
            Intent::UseDriver { id, credential } => {
                let driver = Actor::new(id, Credential::new(credential));
                self.adopt(|registry, session| registry.use_driver(session, driver))
            }
            Intent::SetEndpoint { endpoint, lat, lng } => {
                let location = Location::parse(&lat, &lng);
                self.set_endpoint(endpoint, location);
                Reply::Silent
            }
            Intent::SetDistance(raw) => {
                self.draft.distance = raw;
                self.reestimate();
                Reply::Silent
            }
            Intent::SetDuration(raw) => {
                self.draft.duration = raw;
                self.reestimate();
                Reply::Silent
            }
            Intent::Search(term) => {
                self.search.search(&term);
                Reply::Silent
            }
            Intent::Results => Reply::Text(render_search_results(&self.search.results())),
            Intent::Fare => Reply::Text(render_fare(*self.state.fare.borrow())),
            Intent::Pick { index, endpoint } => match self.search.select(index) {
                Some(location) => {
                    self.set_endpoint(endpoint, Some(location));
                    Reply::Text(format!("{endpoint:?} set to {}, {}", location.lat, location.lng))
                }
                None => {
                    self.state.notify_error("No such search result");
                    Reply::Silent
                }
            },
            Intent::RequestRide => self.request_ride().await,
            Intent::Assign { ride_id, driver_id } => {
                let driver = match driver_id {
                    Some(id) => self.session.driver_actor(&id),
                    None => self.session.driver().cloned(),
                };
                match driver {
                    Some(driver) => {
                        let _ = self.lifecycle.assign_driver(&ride_id, &driver).await;
                    }
                    None => self
                        .state
                        .notify_error("No credential for that driver in this session"),
                }
                Reply::Silent
            }
            Intent::Advance { ride_id } => {
                if let Some(ride) = self.ride(&ride_id) {
                    let _ = self.lifecycle.advance(&self.session, &ride, None).await;
                }
                Reply::Silent
            }
            Intent::Cancel { ride_id } => {
                if let Some(ride) = self.ride(&ride_id) {
                    let _ = self.lifecycle.cancel(&self.session, &ride).await;
                }
                Reply::Silent
            }
            Intent::Nearby {
                lat,
                lng,
                radius_km,
            } => {
                let radius_km = parse_measure(&radius_km).unwrap_or(f64::NAN);
                match self
                    .locator
                    .find_nearby(Location::parse(&lat, &lng), radius_km)
                    .await
                {
                    Ok(_) => Reply::Text(self.render_drivers()),
                    Err(err) => {
                        self.state.notify_error(err.notification());
                        Reply::Silent
                    }
                }
            }
            Intent::AllDrivers => {
                self.locator.show_all().await;
                Reply::Text(self.render_drivers())
            }
            Intent::Locate { lat, lng } => {
                let driver = self.session.driver().cloned();
                let _ = self
                    .locator
                    .update_location(driver.as_ref(), Location::parse(&lat, &lng))
                    .await;
                Reply::Silent
            }
            Intent::Route { ride_id } => match self.ride(&ride_id) {
                Some(ride) => Reply::Text(render_route(&RoutePath::for_ride(&ride))),
                None => Reply::Silent,
            },
            Intent::Refresh => {
                refresh_all(&self.state).await;
                Reply::Text(format!("{}\n{}", self.render_rides(), self.render_drivers()))
            }
            Intent::ListRides => Reply::Text(self.render_rides()),
            Intent::ListDrivers => Reply::Text(self.render_drivers()),
            Intent::Metrics => match self.state.metrics.encode() {
                Ok(text) => Reply::Text(text),
                Err(err) => {
                    warn!(error = %err, "metrics encoding failed");
                    Reply::Silent
                }
            },
            Intent::Help => Reply::Text(HELP.to_string()),
            Intent::Quit => Reply::Quit,
        }
    }

    async fn request_ride(&mut self) -> Reply {
        let distance_km = parse_measure(&self.draft.distance);
        let duration_min = parse_measure(&self.draft.duration);

        // An incomplete draft fails locally, so it is not priced first.
        let ready = self.draft.pickup.is_some()
            && self.draft.dropoff.is_some()
            && self.session.rider().is_some();
        let quote = if ready {
            self.fare.quote_for(distance_km, duration_min).await
        } else {
            None
        };

        let request = RideRequest {
            pickup: self.draft.pickup,
            dropoff: self.draft.dropoff,
            distance_km,
            duration_min,
            fare_estimate: quote.map(|quote| quote.fare),
        };

        match self.lifecycle.request_ride(&self.session, request).await {
            Ok(ride) => {
                self.draft = RideDraft::default();
                self.state.fare.send_replace(None);
                Reply::Text(format!(
                    "ride {} {}, {}",
                    ride.id,
                    ride.status,
                    render_fare(quote)
                ))
            }
            Err(_) => Reply::Silent,
        }
    }

    fn adopt(
        &mut self,
        apply: impl FnOnce(&Registry, &mut Session) -> Result<(), AppError>,
    ) -> Reply {
        match apply(&self.registry, &mut self.session) {
            Ok(()) => self.whoami(),
            Err(err) => {
                self.state.notify_error(err.notification());
                Reply::Silent
            }
        }
    }

    fn set_endpoint(&mut self, endpoint: Endpoint, location: Option<Location>) {
        match endpoint {
            Endpoint::Pickup => self.draft.pickup = location,
            Endpoint::Dropoff => self.draft.dropoff = location,
        }
    }

    fn reestimate(&self) {
        self.fare.trigger(
            parse_measure(&self.draft.distance),
            parse_measure(&self.draft.duration),
        );
    }

    fn ride(&self, ride_id: &str) -> Option<Ride> {
        let ride = self.state.find_ride(ride_id);
        if ride.is_none() {
            self.state
                .notify_error(format!("Ride {ride_id} is not in the current list"));
        }
        ride
    }

    fn whoami(&self) -> Reply {
        let rider = self.session.rider().map_or("-", |r| r.id.as_str());
        let driver = self.session.driver().map_or("-", |d| d.id.as_str());
        Reply::Text(format!("rider: {rider}  driver: {driver}"))
    }

    pub fn render_rides(&self) -> String {
        render_rides(&self.state.rides_snapshot())
    }

    pub fn render_drivers(&self) -> String {
        let view = self.state.drivers_snapshot();
        let heading = match view.scope {
            DriverScope::All => "Available drivers".to_string(),
            DriverScope::Nearby { radius_km, .. } => format!("Drivers within {radius_km} km"),
        };
        format!("{heading}\n{}", render_drivers(&view.drivers))
    }
}

pub fn render_rides(rides: &[Ride]) -> String {
    if rides.is_empty() {
        return "No rides yet".to_string();
    }
    rides
        .iter()
        .map(|ride| {
            let driver = ride.driver_id.as_deref().map_or("-", short_id);
            let fare = ride
                .fare_estimate
                .map_or_else(|| "-".to_string(), |fare| format!("${fare:.2}"));
            format!(
                "{:<24} {:<10} rider {}... driver {} fare {}",
                ride.id,
                ride.status,
                short_id(&ride.rider_id),
                driver,
                fare
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_fare(quote: Option<FareQuote>) -> String {
    match quote {
        None => "no fare estimate".to_string(),
        Some(quote) if quote.is_degraded() => {
            format!("fare ${:.2} (local estimate)", quote.fare)
        }
        Some(quote) => format!(
            "fare ${:.2} (surge x{:.2})",
            quote.fare, quote.surge_multiplier
        ),
    }
}

pub fn render_search_results(results: &[GeoSearchResult]) -> String {
    if results.is_empty() {
        return "No matching places".to_string();
    }
    results
        .iter()
        .enumerate()
        .map(|(i, result)| format!("{:>2}. {}", i + 1, result.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_drivers(drivers: &[Driver]) -> String {
    if drivers.is_empty() {
        return "No drivers yet".to_string();
    }
    drivers
        .iter()
        .map(|driver| format!("{:<24} {} ({})", driver.id, driver.name, driver.vehicle_label()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_route(path: &RoutePath) -> String {
    let points = path
        .positions()
        .iter()
        .map(|[lat, lng]| format!("[{lat:.5}, {lng:.5}]"))
        .collect::<Vec<_>>()
        .join(" → ");
    format!("{points}  ({:.2} km straight line)", path.length_km())
}

fn short_id(id: &str) -> &str {
    match id.char_indices().nth(6) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Prints each new search result list as it lands.
pub async fn print_search_results(mut rx: watch::Receiver<Arc<Vec<GeoSearchResult>>>) {
    while rx.changed().await.is_ok() {
        let results = rx.borrow_and_update().clone();
        if !results.is_empty() {
            println!("{}", render_search_results(&results));
        }
    }
}

/// Prints notifications as they arrive, skipping any that expired while queued.
pub async fn print_notifications(mut rx: broadcast::Receiver<Notification>) {
    loop {
        match rx.recv().await {
            Ok(notification) => {
                if notification.expires_at < Utc::now() {
                    continue;
                }
                let tag = match notification.level {
                    NotificationLevel::Info => "info",
                    NotificationLevel::Error => "error",
                };
                println!("[{tag}] {}", notification.message);
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "notification printer fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
