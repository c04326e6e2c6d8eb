//! HTTP client for the postcodes.io lookup API.
//!
//! Full postcodes are resolved through `/postcodes/{postcode}`; outward codes
//! on their own (e.g. `"AB1"`) through `/outcodes/{outcode}`. A 404 or a
//! result without coordinates is "no match", not an error.

use std::time::Duration;

use armap_core::{normalize_postcode, Coordinate, Geocoder};
use reqwest::{Client, StatusCode, Url};

use crate::error::GeocodeError;
use crate::types::{ApiResponse, LookupResult};

const DEFAULT_BASE_URL: &str = "https://api.postcodes.io/";

/// Longest normalised string treated as a bare outward code.
const MAX_OUTCODE_LEN: usize = 4;

/// Client for the postcodes.io API.
///
/// Use [`PostcodeClient::new`] for production or
/// [`PostcodeClient::with_base_url`] to point at a mock server in tests.
pub struct PostcodeClient {
    client: Client,
    base_url: Url,
}

impl PostcodeClient {
    /// Creates a new client pointed at the public postcodes.io API.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, GeocodeError> {
        Self::with_base_url(timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GeocodeError::InvalidBaseUrl`] if
    /// `base_url` is not a valid base URL.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| GeocodeError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(GeocodeError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// Looks up the coordinate for a postcode or bare outward code.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::InvalidPostcode`] if `postcode` is blank.
    /// - [`GeocodeError::Http`] on network failure.
    /// - [`GeocodeError::UnexpectedStatus`] for non-2xx statuses other than 404.
    /// - [`GeocodeError::Deserialize`] if the body does not match the
    ///   expected shape.
    pub async fn lookup_postcode(&self, postcode: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let trimmed = postcode.trim();
        if trimmed.is_empty() {
            return Err(GeocodeError::InvalidPostcode(postcode.to_owned()));
        }

        let url = self.build_url(trimmed);
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            tracing::debug!(postcode = trimmed, "postcode not found");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(GeocodeError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let envelope: ApiResponse<LookupResult> =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        Ok(envelope.result.and_then(|result| {
            match (result.latitude, result.longitude) {
                (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
                _ => None,
            }
        }))
    }

    /// Builds the lookup URL, percent-encoding the postcode as one path
    /// segment.
    fn build_url(&self, postcode: &str) -> Url {
        let endpoint = if normalize_postcode(postcode).len() <= MAX_OUTCODE_LEN {
            "outcodes"
        } else {
            "postcodes"
        };

        let mut url = self.base_url.clone();
        // `with_base_url` rejects cannot-be-a-base URLs, so segments are
        // always available here.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(endpoint).push(postcode);
        }
        url
    }
}

impl Geocoder for PostcodeClient {
    type Error = GeocodeError;

    async fn lookup(&self, postcode: &str) -> Result<Option<Coordinate>, GeocodeError> {
        self.lookup_postcode(postcode).await
    }
}
