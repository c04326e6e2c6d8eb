use axum::{extract::State, Extension, Json};

use crate::middleware::RequestId;

use super::{map_load_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// Distinct principal names, sorted.
pub(super) async fn list_principals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let table = state
        .load_firms()
        .map_err(|e| map_load_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: table.principal_names(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
