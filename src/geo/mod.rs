use std::cmp::Ordering;

use crate::models::driver::Driver;
use crate::models::location::Location;

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn haversine_km(a: &Location, b: &Location) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Orders drivers nearest-first from `origin`; drivers with no known position go last.
pub fn sort_by_distance(drivers: &mut [Driver], origin: &Location) {
    drivers.sort_by(|a, b| match (&a.location, &b.location) {
        (Some(la), Some(lb)) => haversine_km(origin, la).total_cmp(&haversine_km(origin, lb)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
