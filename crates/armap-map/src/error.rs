use thiserror::Error;

/// Errors raised while producing the map document.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error("marker serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write map to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
