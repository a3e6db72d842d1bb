pub mod fare;
pub mod geosearch;
pub mod lifecycle;
pub mod locator;
pub mod refresh;
pub mod registry;
