mod locations;
mod principals;

use std::path::PathBuf;
use std::sync::Arc;

use armap_core::{
    CoordinateResolver, DataLoadError, FirmTable, MaybeCached, RelationshipFilter,
};
use armap_geocode::PostcodeClient;
use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};
use crate::pages;

pub type Resolver = CoordinateResolver<MaybeCached<PostcodeClient>>;

/// Shared across requests. The firm table itself is re-read per request;
/// only the resolver (and its postcode cache) lives for the process.
#[derive(Clone)]
pub struct AppState {
    pub firms_csv: Arc<PathBuf>,
    pub resolver: Arc<Resolver>,
}

impl AppState {
    /// Reads the firm table from disk.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError`] if the file is missing or malformed.
    pub fn load_firms(&self) -> Result<FirmTable, DataLoadError> {
        FirmTable::load(&self.firms_csv)
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    firm_table: &'static str,
}

/// `?principal=&relationship=` shared by the JSON and page routes.
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub principal: Option<String>,
    pub relationship: Option<String>,
}

impl ViewQuery {
    /// The requested principal; empty selects every firm.
    #[must_use]
    pub fn principal(&self) -> &str {
        self.principal.as_deref().map_or("", str::trim)
    }

    /// The requested relationship filter. Absent means `All`.
    ///
    /// # Errors
    ///
    /// Returns a message naming the accepted values when the parameter is
    /// not one of them.
    pub fn filter(&self) -> Result<RelationshipFilter, String> {
        self.relationship.as_deref().unwrap_or_default().parse()
    }
}

impl ResponseMeta {
    pub(crate) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(crate) fn map_load_error(request_id: String, error: &DataLoadError) -> ApiError {
    tracing::error!(error = %error, "firm table unavailable");
    ApiError::new(request_id, "data_unavailable", error.to_string())
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/principals", get(principals::list_principals))
        .route("/api/v1/locations", get(locations::list_locations))
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api_router())
        .merge(pages::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match tokio::fs::metadata(state.firms_csv.as_path()).await {
        Ok(m) if m.is_file() => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    firm_table: "ok",
                },
                meta,
            }),
        ),
        result => {
            tracing::warn!(
                path = %state.firms_csv.display(),
                error = ?result.err(),
                "health check: firm table unavailable"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        firm_table: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
