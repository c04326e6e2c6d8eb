use armap_core::{aggregate, consolidate, FirmRecord, RelationshipStats, ResolvedLocation};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_load_error, ApiError, ApiResponse, AppState, ResponseMeta, ViewQuery};

#[derive(Debug, Serialize)]
pub(super) struct LocationsData {
    /// Empty when every firm was requested.
    pub query: String,
    pub relationship: &'static str,
    /// `null` when the principal has no row of its own.
    pub principal: Option<FirmRecord>,
    pub principal_location: Option<ResolvedLocation>,
    /// Counts over all located ARs, before the relationship filter.
    pub stats: RelationshipStats,
    pub locations: Vec<ResolvedLocation>,
}

pub(super) async fn list_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<ViewQuery>,
) -> Result<Json<ApiResponse<LocationsData>>, ApiError> {
    let filter = params
        .filter()
        .map_err(|msg| ApiError::new(req_id.0.clone(), "validation_error", msg))?;
    let table = state
        .load_firms()
        .map_err(|e| map_load_error(req_id.0.clone(), &e))?;

    let result = consolidate(&table, params.principal(), state.resolver.as_ref()).await;
    let stats = aggregate(&result.ar_locations);
    let locations = result.filtered(filter).cloned().collect();

    Ok(Json(ApiResponse {
        data: LocationsData {
            query: result.query,
            relationship: filter.as_str(),
            principal: result.principal_record,
            principal_location: result.principal_location,
            stats,
            locations,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
