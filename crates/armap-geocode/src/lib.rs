//! HTTP postcode geocoder backed by the postcodes.io API.

pub mod client;
pub mod error;
pub mod types;

pub use client::PostcodeClient;
pub use error::GeocodeError;
