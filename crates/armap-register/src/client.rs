//! HTTP client for the financial services register API.

use std::time::Duration;

use armap_core::ArDetail;
use reqwest::{Client, Url};

use crate::error::RegisterError;
use crate::source::RegisterSource;
use crate::types::RegisterEnvelope;

const AUTH_EMAIL_HEADER: &str = "X-Auth-Email";
const AUTH_KEY_HEADER: &str = "X-Auth-Key";

/// API credentials sent with every request.
#[derive(Clone)]
pub struct RegisterCredentials {
    pub email: String,
    pub key: String,
}

impl std::fmt::Debug for RegisterCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterCredentials")
            .field("email", &self.email)
            .field("key", &"[redacted]")
            .finish()
    }
}

/// Client for the register's `Firm/{frn}/AR` endpoint.
///
/// Non-2xx responses are surfaced as [`RegisterError::UnexpectedStatus`];
/// nothing is retried.
pub struct RegisterClient {
    client: Client,
    base_url: Url,
    credentials: RegisterCredentials,
}

impl RegisterClient {
    /// Creates a client for the register API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`RegisterError::InvalidBaseUrl`] if
    /// `base_url` is not a valid base URL.
    pub fn new(
        base_url: &str,
        credentials: RegisterCredentials,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, RegisterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| RegisterError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(RegisterError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        Ok(Self {
            client,
            base_url: parsed,
            credentials,
        })
    }

    /// Fetches the appointed representatives of the firm with reference
    /// number `frn`.
    ///
    /// # Errors
    ///
    /// - [`RegisterError::Http`] on network failure.
    /// - [`RegisterError::UnexpectedStatus`] for any non-2xx status.
    /// - [`RegisterError::Deserialize`] if the body is not the expected
    ///   envelope.
    pub async fn fetch_appointed_representatives(
        &self,
        frn: &str,
    ) -> Result<Vec<ArDetail>, RegisterError> {
        let url = self.ar_url(frn.trim());
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .header(AUTH_EMAIL_HEADER, &self.credentials.email)
            .header(AUTH_KEY_HEADER, &self.credentials.key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegisterError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let envelope: RegisterEnvelope =
            serde_json::from_str(&body).map_err(|e| RegisterError::Deserialize {
                context: format!("appointed representatives of FRN {frn}"),
                source: e,
            })?;

        let details: Vec<ArDetail> = envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(ArDetail::from)
            .collect();

        tracing::debug!(
            frn,
            status = envelope.status.as_deref().unwrap_or_default(),
            message = envelope.message.as_deref().unwrap_or_default(),
            count = details.len(),
            "register answered"
        );
        Ok(details)
    }

    fn ar_url(&self, frn: &str) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("Firm").push(frn).push("AR");
        }
        url
    }
}

impl RegisterSource for RegisterClient {
    async fn appointed_representatives(&self, frn: &str) -> Result<Vec<ArDetail>, RegisterError> {
        self.fetch_appointed_representatives(frn).await
    }
}
