use std::path::Path;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use tower::ServiceExt;

use super::*;

const FIRMS: &str = "\
name,regulatory_number,company_number,postcode,address,website,services,gps_latitude,gps_longitude,principal_rep_name,principal_rep_reg_number,AR_relationship
Acme Ltd,100001,C0001,EC1A 1BB,1 High St,https://acme.example,Advice,51.52,-0.10,,,
North Advisers,200001,,NE1 1AA,2 Quay Rd,,,54.97,-1.61,Acme Ltd,100001,Full
South Introductions,200002,,SO14 2AA,3 Dock Ln,nan,,50.90,-1.40,Acme Ltd,100001,Introducer AR
Nowhere Ltd,200003,,,,,,52.00,-1.00,Acme Ltd,100001,Full
Oxford Planning,300001,,OX1 1AA,,,,51.75,-1.25,Zed Group,900001,Full
";

/// State over a CSV on disk. Every test row carries GPS, so the geocoder
/// (pointed at a closed port) is never called.
fn state_for(path: &Path) -> AppState {
    let client = PostcodeClient::with_base_url(1, "armap-test/0.1", "http://127.0.0.1:9")
        .expect("client construction should not fail");
    AppState {
        firms_csv: Arc::new(path.to_path_buf()),
        resolver: Arc::new(CoordinateResolver::new(MaybeCached::new(client, true))),
    }
}

fn seeded() -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("firms.csv");
    std::fs::write(&path, FIRMS).expect("seed firms");
    let app = build_app(state_for(&path));
    (dir, app)
}

async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response")
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).expect("json parse")
}

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn api_error_data_unavailable_maps_to_internal_error() {
    let response = ApiError::new("req-1", "data_unavailable", "missing").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn view_query_defaults_to_show_all() {
    let query = ViewQuery::default();
    assert_eq!(query.principal(), "");
    assert_eq!(query.filter(), Ok(RelationshipFilter::All));
}

#[tokio::test]
async fn health_reports_ok_with_readable_table() {
    let (_dir, app) = seeded();
    let response = get(app, "/api/v1/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn health_degrades_when_table_is_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_app(state_for(&dir.path().join("absent.csv")));

    let response = get(app, "/api/v1/health").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let (_dir, app) = seeded();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-abc")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-abc")
    );
    let json = body_json(response).await;
    assert_eq!(json["meta"]["request_id"], "req-abc");
}

#[tokio::test]
async fn principals_are_sorted_and_distinct() {
    let (_dir, app) = seeded();
    let json = body_json(get(app, "/api/v1/principals").await).await;
    assert_eq!(json["data"], serde_json::json!(["Acme Ltd", "Zed Group"]));
}

#[tokio::test]
async fn locations_for_principal() {
    let (_dir, app) = seeded();
    let response = get(app, "/api/v1/locations?principal=Acme%20Ltd").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["principal"]["name"], "Acme Ltd");
    assert_eq!(data["principal_location"]["is_principal"], true);
    assert_eq!(data["stats"]["total"], 2);
    assert_eq!(data["stats"]["full_count"], 1);
    assert_eq!(data["stats"]["introducer_count"], 1);

    let names: Vec<&str> = data["locations"]
        .as_array()
        .expect("locations array")
        .iter()
        .filter_map(|l| l["name"].as_str())
        .collect();
    assert_eq!(names, vec!["North Advisers", "South Introductions"]);
}

#[tokio::test]
async fn relationship_filter_narrows_locations_not_stats() {
    let (_dir, app) = seeded();
    let json = body_json(
        get(
            app,
            "/api/v1/locations?principal=Acme%20Ltd&relationship=introducer",
        )
        .await,
    )
    .await;

    let locations = json["data"]["locations"].as_array().expect("locations");
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0]["name"], "South Introductions");
    assert_eq!(json["data"]["stats"]["total"], 2);
}

#[tokio::test]
async fn unknown_relationship_filter_is_rejected() {
    let (_dir, app) = seeded();
    let response = get(app, "/api/v1/locations?relationship=partial").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn unknown_principal_is_an_empty_result() {
    let (_dir, app) = seeded();
    let json = body_json(get(app, "/api/v1/locations?principal=Nobody").await).await;

    assert!(json["data"]["principal"].is_null());
    assert_eq!(json["data"]["stats"]["total"], 0);
    assert_eq!(json["data"]["locations"], serde_json::json!([]));
}

#[tokio::test]
async fn show_all_lists_every_locatable_firm() {
    let (_dir, app) = seeded();
    let json = body_json(get(app, "/api/v1/locations").await).await;

    assert_eq!(json["data"]["query"], "");
    assert_eq!(json["data"]["stats"]["total"], 4);
}

#[tokio::test]
async fn missing_table_is_a_json_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_app(state_for(&dir.path().join("absent.csv")));

    let response = get(app, "/api/v1/principals").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "data_unavailable");
}

#[tokio::test]
async fn dashboard_shows_principal_and_ar_table() {
    let (_dir, app) = seeded();
    let response = get(app, "/?principal=Acme+Ltd").await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Principal FCA Number:</strong> 100001"));
    assert!(html.contains("<strong>North Advisers</strong>"));
    assert!(html.contains("<strong>South Introductions</strong>"));
    assert!(html.contains("id=\"stat-total\">2<"));
    assert!(html.contains("relationship=all"));
}

#[tokio::test]
async fn dashboard_filter_hides_other_relationship() {
    let (_dir, app) = seeded();
    let html = body_text(get(app, "/?principal=Acme+Ltd&relationship=full").await).await;

    assert!(html.contains("<strong>North Advisers</strong>"));
    assert!(!html.contains("South Introductions"));
    assert!(html.contains("id=\"stat-introducer\">1<"), "stats stay unfiltered");
}

#[tokio::test]
async fn dashboard_keeps_map_when_filter_leaves_no_rows() {
    let (_dir, app) = seeded();
    let html = body_text(get(app, "/?principal=Zed+Group&relationship=introducer").await).await;

    assert!(!html.contains("No locations found"), "{html}");
    assert!(html.contains("<iframe class=\"map\""));
    assert!(html.contains("No representatives match the selected relationship."));
    assert!(html.contains("id=\"stat-total\">1<"));
}

#[tokio::test]
async fn dashboard_reports_unknown_principal() {
    let (_dir, app) = seeded();
    let html = body_text(get(app, "/?principal=Nobody").await).await;

    assert!(html.contains("No locations found for this principal company name."));
    assert!(html.contains("not listed in the firm table"));
}

#[tokio::test]
async fn dashboard_survives_missing_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_app(state_for(&dir.path().join("absent.csv")));

    let response = get(app, "/").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let html = body_text(response).await;
    assert!(html.contains("Firm data could not be loaded"));
}

#[tokio::test]
async fn map_document_has_principal_and_filtered_markers() {
    let (_dir, app) = seeded();
    let response = get(app, "/map?principal=Acme+Ltd&relationship=introducer").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    assert!(content_type.starts_with("text/html"));

    let html = body_text(response).await;
    assert!(html.contains("data-marker-count=\"2\""), "{html}");
}
