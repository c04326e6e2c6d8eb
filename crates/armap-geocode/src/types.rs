//! postcodes.io response types.
//!
//! Every response is wrapped in `{"status": <http status>, "result": ...}`;
//! errors carry `"error"` instead of `"result"`.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The subset of a `/postcodes/{postcode}` or `/outcodes/{outcode}` result
/// the resolver needs. Non-geographic postcodes carry `null` coordinates.
#[derive(Debug, Default, Deserialize)]
pub struct LookupResult {
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub outcode: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}
