use thiserror::Error;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// The firm table could not be loaded. Fatal to the current request only.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("failed to read firm table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed firm table: {0}")]
    Csv(#[from] csv::Error),

    #[error("firm table is missing required column '{0}'")]
    MissingColumn(&'static str),
}

/// A row whose coordinate could not be determined. Callers skip the row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot locate {name} ({postcode}): {reason}")]
pub struct UnresolvableLocation {
    pub name: String,
    pub postcode: String,
    pub reason: String,
}

/// The queried principal has no row of its own in the firm table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("principal '{name}' not found")]
pub struct PrincipalNotFound {
    pub name: String,
}
