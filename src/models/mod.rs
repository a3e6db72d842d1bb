pub mod driver;
pub mod fare;
pub mod location;
pub mod place;
pub mod ride;
pub mod rider;
pub mod route;
