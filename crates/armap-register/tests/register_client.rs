//! Integration tests for `RegisterClient` using wiremock HTTP mocks.

use armap_register::{RegisterClient, RegisterCredentials, RegisterError, RegisterSource};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> RegisterClient {
    RegisterClient::new(
        base_url,
        RegisterCredentials {
            email: "ops@example.com".to_string(),
            key: "secret-key".to_string(),
        },
        5,
        "armap-test/0.1",
    )
    .expect("client construction should not fail")
}

#[tokio::test]
async fn fetch_sends_credentials_and_maps_entries() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "Status": "FSR-API-02-01-00",
        "Message": "Ok. Firm AR found",
        "Data": [
            {
                "Name": "Acme North",
                "Insurance Distribution": "Yes",
                "Tied Agent": "No",
                "EEA Tied Agent": "No",
                "Relationship": "Full",
                "FRN": 654_321,
                "Effective Date": "01/02/2020"
            },
            {
                "Name": "Acme Introductions",
                "Relationship": "Introducer AR",
                "FRN": "765432"
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/services/V0.1/Firm/123456/AR"))
        .and(header("X-Auth-Email", "ops@example.com"))
        .and(header("X-Auth-Key", "secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&format!("{}/services/V0.1", server.uri()));
    let details = client
        .appointed_representatives("123456")
        .await
        .expect("fetch should succeed");

    assert_eq!(details.len(), 2);
    assert_eq!(details[0].name, "Acme North");
    assert_eq!(details[0].insurance_distribution, "Yes");
    assert_eq!(details[0].firm_reference_number, "654321");
    assert_eq!(details[0].effective_from, "01/02/2020");
    assert_eq!(details[1].ar_relationship, "Introducer AR");
    assert!(details[1].tied_agent.is_empty());
}

#[tokio::test]
async fn null_data_is_an_empty_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Firm/123456/AR"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&serde_json::json!({
            "Status": "FSR-API-02-01-11",
            "Message": "No AR found",
            "Data": null
        })))
        .mount(&server)
        .await;

    let details = test_client(&server.uri())
        .fetch_appointed_representatives("123456")
        .await
        .expect("fetch");

    assert!(details.is_empty());
}

#[tokio::test]
async fn unauthorised_is_surfaced_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let result = test_client(&server.uri())
        .fetch_appointed_representatives("123456")
        .await;

    assert!(
        matches!(result, Err(RegisterError::UnexpectedStatus { status: 401, .. })),
        "expected UnexpectedStatus(401), got: {result:?}"
    );
}

#[tokio::test]
async fn malformed_body_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let result = test_client(&server.uri())
        .fetch_appointed_representatives("123456")
        .await;

    assert!(
        matches!(result, Err(RegisterError::Deserialize { .. })),
        "expected Deserialize error, got: {result:?}"
    );
}
