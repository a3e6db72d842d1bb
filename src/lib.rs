pub mod config;
pub mod engine;
pub mod error;
pub mod geo;
pub mod models;
pub mod observability;
pub mod remote;
pub mod session;
pub mod state;
pub mod surface;
