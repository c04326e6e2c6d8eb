//! HTML routes: the dashboard and the embeddable map document.

use armap_core::{aggregate, consolidate, RelationshipFilter, RelationshipStats, ResolvedLocation};
use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use reqwest::Url;

use crate::api::{map_load_error, ApiError, AppState, ViewQuery};
use crate::middleware::RequestId;

const NOT_AVAILABLE: &str = "N/A";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/map", get(map_document))
}

struct SelectOption {
    value: String,
    label: String,
    selected: bool,
}

struct ArRow<'a> {
    name: &'a str,
    regulatory_number: &'a str,
    company_number: &'a str,
    address: &'a str,
    postcode: &'a str,
    relationship: &'static str,
    website: Option<&'a str>,
}

#[derive(Template, Default)]
#[template(path = "dashboard.html")]
struct DashboardTemplate<'a> {
    error: Option<String>,
    principal_options: Vec<SelectOption>,
    relationship_options: Vec<SelectOption>,
    show_all: bool,
    query: &'a str,
    principal_number: Option<&'a str>,
    stats: RelationshipStats,
    /// Something to draw, even if the relationship filter leaves no rows.
    has_map: bool,
    map_href: String,
    rows: Vec<ArRow<'a>>,
}

impl<'a> ArRow<'a> {
    fn from_location(location: &'a ResolvedLocation) -> Self {
        let record = &location.record;
        Self {
            name: &record.name,
            regulatory_number: &record.regulatory_number,
            company_number: record.company_number.as_deref().unwrap_or(NOT_AVAILABLE),
            address: record.address.as_deref().unwrap_or_default(),
            postcode: record.postcode().unwrap_or_default(),
            relationship: location.relationship().label(),
            website: record.website_url(),
        }
    }
}

async fn dashboard(State(state): State<AppState>, Query(params): Query<ViewQuery>) -> Response {
    let filter = params.filter().unwrap_or_else(|msg| {
        tracing::warn!(reason = %msg, "ignoring relationship filter");
        RelationshipFilter::All
    });

    let table = match state.load_firms() {
        Ok(table) => table,
        Err(e) => {
            tracing::error!(error = %e, "firm table unavailable");
            let page = DashboardTemplate {
                error: Some(e.to_string()),
                ..DashboardTemplate::default()
            };
            return render_page(StatusCode::INTERNAL_SERVER_ERROR, &page);
        }
    };

    let result = consolidate(&table, params.principal(), state.resolver.as_ref()).await;
    let principal_number = match result.principal() {
        Ok(record) => Some(record.regulatory_number.as_str()),
        Err(e) => {
            if !result.is_show_all() {
                tracing::info!(error = %e, "principal has no row of its own");
            }
            None
        }
    };

    let principal_options = table
        .principal_names()
        .into_iter()
        .map(|name| SelectOption {
            selected: name == result.query,
            label: name.clone(),
            value: name,
        })
        .collect();
    let relationship_options = RelationshipFilter::ALL
        .iter()
        .map(|option| SelectOption {
            value: option.as_str().to_owned(),
            label: option.label().to_owned(),
            selected: *option == filter,
        })
        .collect();

    let stats = aggregate(&result.ar_locations);
    let page = DashboardTemplate {
        error: None,
        principal_options,
        relationship_options,
        show_all: result.is_show_all(),
        query: &result.query,
        principal_number,
        has_map: stats.total > 0 || result.principal_location.is_some(),
        stats,
        map_href: map_href(&result.query, filter),
        rows: result.filtered(filter).map(ArRow::from_location).collect(),
    };
    render_page(StatusCode::OK, &page)
}

async fn map_document(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<ViewQuery>,
) -> Result<Html<String>, ApiError> {
    let filter = params
        .filter()
        .map_err(|msg| ApiError::new(req_id.0.clone(), "validation_error", msg))?;
    let table = state
        .load_firms()
        .map_err(|e| map_load_error(req_id.0.clone(), &e))?;

    let result = consolidate(&table, params.principal(), state.resolver.as_ref()).await;
    let html = armap_map::render_html(&result.map_locations(filter)).map_err(|e| {
        tracing::error!(error = %e, "map rendering failed");
        ApiError::new(req_id.0.clone(), "render_error", e.to_string())
    })?;

    Ok(Html(html))
}

fn render_page<T: Template>(status: StatusCode, page: &T) -> Response {
    match page.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "dashboard template failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "page rendering failed").into_response()
        }
    }
}

/// `/map` link for the current selection, query-string encoded.
fn map_href(principal: &str, filter: RelationshipFilter) -> String {
    let Ok(mut url) = Url::parse("http://localhost/map") else {
        return "/map".to_string();
    };
    url.query_pairs_mut()
        .append_pair("principal", principal)
        .append_pair("relationship", filter.as_str());
    format!("{}?{}", url.path(), url.query().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_href_encodes_principal() {
        assert_eq!(
            map_href("Acme & Sons Ltd", RelationshipFilter::Introducer),
            "/map?principal=Acme+%26+Sons+Ltd&relationship=introducer"
        );
    }

    #[test]
    fn map_href_for_show_all() {
        assert_eq!(
            map_href("", RelationshipFilter::All),
            "/map?principal=&relationship=all"
        );
    }
}
