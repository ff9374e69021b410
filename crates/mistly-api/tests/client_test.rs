#![allow(clippy::unwrap_used)]
// Integration tests for `MistClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mistly_api::{Error, MistClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, MistClient) {
    let server = MockServer::start().await;
    let token = SecretString::from("test-token".to_string());
    let client =
        MistClient::from_token(&server.uri(), &token, &TransportConfig::default()).unwrap();
    (server, client)
}

const ORG: &str = "9777c1a0-6ef6-11e6-8bbf-02e208b2d34f";

// ── Sites ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_site_sends_token_header() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sites/4ac1dcf4-9d8b-7211-65c4-057819f0862b"))
        .and(header("Authorization", "Token test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "4ac1dcf4-9d8b-7211-65c4-057819f0862b",
            "name": "HQ",
            "org_id": ORG,
            "timezone": "America/New_York",
            "latlng": { "lat": 40.7, "lng": -74.0 }
        })))
        .mount(&server)
        .await;

    let site = client
        .get_site("4ac1dcf4-9d8b-7211-65c4-057819f0862b")
        .await
        .unwrap();

    assert_eq!(site.name, "HQ");
    assert_eq!(site.timezone.as_deref(), Some("America/New_York"));
    assert!(site.extra.contains_key("latlng"));
}

#[tokio::test]
async fn test_get_site_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sites/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "not found" })))
        .mount(&server)
        .await;

    let err = client.get_site("missing").await.unwrap_err();
    assert!(err.is_not_found(), "expected not-found, got: {err:?}");
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn test_search_sites_by_name() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/orgs/{ORG}/sites/search")))
        .and(query_param("name", "Branch Office"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "id": "s-1", "name": "Branch Office", "org_id": ORG }
            ],
            "total": 1,
            "limit": 100
        })))
        .mount(&server)
        .await;

    let found = client
        .search_sites_by_name(ORG, "Branch Office")
        .await
        .unwrap();

    assert_eq!(found.results.len(), 1);
    assert_eq!(found.results[0].id, "s-1");
    assert_eq!(found.total, Some(1));
}

#[tokio::test]
async fn test_list_sites_paginates_until_short_page() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/orgs/{ORG}/sites")))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "a", "name": "A", "org_id": ORG },
            { "id": "b", "name": "B", "org_id": ORG }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/orgs/{ORG}/sites")))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "c", "name": "C", "org_id": ORG }
        ])))
        .mount(&server)
        .await;

    let all = client
        .paginate_all(2, |page, limit| client.list_sites(ORG, page, limit))
        .await
        .unwrap();

    let names: Vec<_> = all.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["A", "B", "C"]);
}

// ── Inventory ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_inventory_with_type_filter() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/orgs/{ORG}/inventory")))
        .and(query_param("type", "ap"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "mac": "5c5b35000001",
            "type": "ap",
            "serial": "FXLH2015150025",
            "model": "AP43",
            "site_id": null,
            "connected": true
        }])))
        .mount(&server)
        .await;

    let devices = client
        .list_inventory(ORG, Some("ap"), 1, 100)
        .await
        .unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].device_type, "ap");
    assert_eq!(devices[0].model.as_deref(), Some("AP43"));
    assert!(devices[0].connected);
    assert!(devices[0].site_id.is_none());
}

#[tokio::test]
async fn test_assign_inventory_body() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path(format!("/api/v1/orgs/{ORG}/inventory")))
        .and(body_json(json!({
            "op": "assign",
            "site_id": "site-7",
            "macs": ["00:11:22:33:44:55", "00:11:22:33:44:56"],
            "no_reassign": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "op": "assign",
            "success": ["001122334455", "001122334456"],
            "error": [],
            "reason": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let macs = vec!["00:11:22:33:44:55".to_owned(), "00:11:22:33:44:56".to_owned()];
    let resp = client.assign_inventory(ORG, "site-7", &macs).await.unwrap();

    assert_eq!(resp.op.as_deref(), Some("assign"));
    assert_eq!(resp.success.len(), 2);
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_to_invalid_token() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sites/x"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.get_site("x").await;
    assert!(
        matches!(result, Err(Error::InvalidToken)),
        "expected InvalidToken, got: {result:?}"
    );
}

#[tokio::test]
async fn test_rate_limited_reads_retry_after() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sites/x"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "12"))
        .mount(&server)
        .await;

    let result = client.get_site("x").await;
    assert!(
        matches!(result, Err(Error::RateLimited { retry_after_secs: 12 })),
        "expected RateLimited, got: {result:?}"
    );
}

#[tokio::test]
async fn test_plain_text_error_body_is_kept() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path(format!("/api/v1/orgs/{ORG}/inventory")))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid mac"))
        .mount(&server)
        .await;

    let err = client
        .assign_inventory(ORG, "site-1", &["zz".to_owned()])
        .await
        .unwrap_err();

    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "invalid mac");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_success_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/sites/x"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.get_site("x").await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}
