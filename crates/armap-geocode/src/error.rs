use thiserror::Error;

/// Errors returned by the postcode lookup client.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Any non-2xx status other than 404.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The postcode is blank and cannot be looked up.
    #[error("invalid postcode '{0}'")]
    InvalidPostcode(String),

    #[error("invalid base URL '{base_url}': {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}
