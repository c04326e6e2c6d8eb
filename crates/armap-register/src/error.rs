use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode AR details for FRN {frn}: {source}")]
    Serialize {
        frn: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid register base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("malformed harvest table: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("harvest table is missing required column '{0}'")]
    MissingColumn(&'static str),
}
