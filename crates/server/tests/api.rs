use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use catalog::{Catalog, CatalogEntry};
use http_body_util::BodyExt;
use index::build_index;
use matcher::{MatcherConfig, MedicineMatcher, RegionTable};
use semantic::testing::{FailingEncoder, KeywordEncoder};
use semantic::QueryEncoder;
use serde_json::{json, Value};
use server::{build_router, ServerConfig, ServerState};
use std::sync::Arc;
use tower::ServiceExt;

const VOCAB: &[&str] = &["headache", "stomach", "upset", "rash", "penicillin"];

async fn keyword_app() -> Router {
    let catalog = Catalog::from_entries(vec![
        CatalogEntry::new("Aspirin", "headache", "stomach upset").with_rating("8.1"),
        CatalogEntry::new("Ibuprofen", "headache", "rash"),
    ]);
    let encoder = QueryEncoder::new(Arc::new(KeywordEncoder::new(VOCAB)), 16);
    let index = build_index(&catalog, &encoder, 0).await.unwrap();
    let matcher = MedicineMatcher::new(
        Arc::new(index),
        encoder,
        Arc::new(RegionTable::builtin()),
        MatcherConfig::default(),
    )
    .unwrap();
    app_for(matcher)
}

fn failing_app() -> Router {
    let matcher = MedicineMatcher::new(
        Arc::new(index::EmbeddingIndex::empty("failing-test")),
        QueryEncoder::new(Arc::new(FailingEncoder), 0),
        Arc::new(RegionTable::builtin()),
        MatcherConfig::default(),
    )
    .unwrap();
    app_for(matcher)
}

fn app_for(matcher: MedicineMatcher) -> Router {
    let state = ServerState::new(ServerConfig::default(), Arc::new(matcher));
    build_router(Arc::new(state))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value, Option<String>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body, request_id)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
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
async fn medicines_returns_ranked_candidates() {
    let (status, body, _) = send(
        keyword_app().await,
        get("/medicines?symptom=headache&allergy=penicillin&region=NY"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    let names: Vec<&str> = results
        .iter()
        .map(|c| c["drug_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ibuprofen", "Aspirin"]);

    let aspirin = &results[1];
    assert_eq!(aspirin["medical_condition"], "headache");
    assert_eq!(aspirin["side_effects"], "stomach upset");
    assert_eq!(aspirin["rating"], "8.1");
    assert_eq!(aspirin["drug_link"], "");
    assert_eq!(aspirin["available_in_region"], true);
    assert!(aspirin["confidence_score"].as_f64().unwrap() > 0.3);
    assert!(aspirin["allergy_risk"].as_f64().unwrap() < 0.4);
    assert_eq!(results[0]["rating"], "N/A");
}

#[tokio::test]
async fn medicines_excludes_matching_allergy() {
    let (status, body, _) = send(
        keyword_app().await,
        get("/medicines?symptom=headache&allergy=stomach%20upset"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["drug_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ibuprofen"]);
    assert_eq!(body[0]["available_in_region"], Value::Null);
}

#[tokio::test]
async fn medicines_rejects_bad_parameters() {
    for uri in [
        "/medicines?symptom=headache&allergy=x&top_k=0",
        "/medicines?symptom=headache&allergy=x&top_k=-3",
        "/medicines?symptom=headache&allergy=x&top_k=many",
        "/medicines?symptom=headache&allergy=x&min_confidence=2",
        "/medicines?allergy=x",
    ] {
        let (status, body, _) = send(keyword_app().await, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"]["code"], "INVALID_REQUEST", "{uri}");
        assert!(body["error"]["message"].as_str().is_some());
    }
}

#[tokio::test]
async fn encoder_failure_is_a_server_error() {
    let (status, body, _) = send(
        failing_app(),
        get("/medicines?symptom=headache&allergy=penicillin"),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "ENCODER_ERROR");
}

#[tokio::test]
async fn nlp_search_uses_body_prompt() {
    let (status, body, _) = send(
        keyword_app().await,
        post_json("/nlp-search?top_k=1", json!({ "prompt": "bad headache" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["drug_name"], "Ibuprofen");
    assert!(results[0]["confidence_score"].as_f64().is_some());
    assert!(results[0].get("allergy_risk").is_none());
}

#[tokio::test]
async fn nlp_search_rejects_missing_prompt() {
    let (status, body, _) = send(
        keyword_app().await,
        post_json("/nlp-search", json!({ "text": "headache" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");

    let (status, _, _) = send(
        keyword_app().await,
        post_json("/nlp-search?top_k=0", json!({ "prompt": "headache" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn regions_and_pharmacies() {
    let (status, body, _) = send(keyword_app().await, get("/regions")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["region_code"] == "NY"));

    let (status, body, _) = send(keyword_app().await, get("/pharmacies?region_code=ny")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.as_array().unwrap().is_empty());
    assert!(body[0]["pharmacy_name"].as_str().is_some());

    let (status, body, _) = send(keyword_app().await, get("/pharmacies?region_code=ZZ")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _, _) = send(keyword_app().await, get("/pharmacies")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn probes_and_info() {
    let (status, body, _) = send(keyword_app().await, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body, _) = send(keyword_app().await, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["index"]["entries"], 2);
    assert_eq!(body["index"]["model"], "keyword-test");

    let (status, body, _) = send(keyword_app().await, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["notice"].as_str().unwrap().contains("best effort"));
}

#[tokio::test]
async fn metrics_are_not_found_when_disabled() {
    let (status, body, _) = send(keyword_app().await, get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, body, _) = send(keyword_app().await, get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn request_id_is_echoed_or_generated() {
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let (_, _, id) = send(keyword_app().await, request).await;
    assert_eq!(id.as_deref(), Some("abc-123"));

    let (_, _, id) = send(keyword_app().await, get("/health")).await;
    assert_eq!(id.map(|id| id.len()), Some(36));
}
