//! HTTP adapter tests driven through the router without a listener

use alarm_query::api::{build_router, AppState};
use alarm_query::search::QueryConfig;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    build_router(AppState::from_config(&QueryConfig::default()))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_compile_query() {
    let (status, body) = send(
        app(),
        post_json(
            "/v1/alarms/query",
            json!({
                "page": 2,
                "limit": 10,
                "sort": { "prop": "risk", "order": "asc" },
                "scenario_name": "SSH brute force",
                "address": {
                    "source_ip_option": "!=", "source_ip": "10.0.0.1", "join_option": "And",
                    "destination_ip_option": "=", "destination_ip": "10.0.0.2"
                }
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["index"], "alarms");
    assert_eq!(body["aggregation"], false);
    assert_eq!(body["fingerprint"].as_str().unwrap().len(), 64);

    let doc = &body["body"];
    assert_eq!(doc["from"], 10);
    assert_eq!(doc["sort"], json!([{ "risk": { "order": "asc", "unmapped_type": "long" } }]));
    assert_eq!(
        doc["query"]["bool"]["must_not"],
        json!([{ "match": { "source": "10.0.0.1" } }])
    );
    assert!(doc["query"]["bool"]["must"]
        .as_array()
        .unwrap()
        .contains(&json!({ "match": { "directiveName": "SSH brute force" } })));
}

#[tokio::test]
async fn test_unknown_field_is_bad_request() {
    let (status, body) = send(app(), post_json("/v1/alarms/query", json!({ "hostname": "db-1" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"].as_str().unwrap().contains("hostname"));
}

#[tokio::test]
async fn test_out_of_range_page_is_bad_request() {
    let (status, body) = send(
        app(),
        post_json(
            "/v1/alarms/query",
            json!({ "page": 9_000_000_000_000_000_000u64, "limit": 10 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "invalid_pagination");
}

#[tokio::test]
async fn test_bad_date_is_bad_request() {
    let (status, _) = send(
        app(),
        post_json(
            "/v1/alarms/query",
            json!({ "date": { "all": false, "value": ["01/01/2024", "02/01/2024"] } }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bulk_query() {
    let (status, body) = send(
        app(),
        post_json(
            "/v1/alarms/bulk-query",
            json!({
                "status": "open",
                "aggregatedTerms": { "field": "scenario_name", "terms": ["port scan"] }
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["query"]["bool"]["must"][2],
        json!({ "terms": { "directiveName": ["port scan"] } })
    );
    assert!(body["query"].get("from").is_none());
}

#[tokio::test]
async fn test_bulk_query_without_terms() {
    let (status, _) = send(app(), post_json("/v1/alarms/bulk-query", json!({ "status": "open" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_fields() {
    let request = Request::builder().uri("/v1/alarms/fields").body(Body::empty()).unwrap();
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    let fields = body.as_array().unwrap();
    assert_eq!(fields.len(), 10);
    assert!(fields.contains(&json!({ "name": "address", "kind": "mixed", "constraint": null })));
}
