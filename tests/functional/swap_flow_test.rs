//! End-to-end swap flows through the router

#[path = "../common/mod.rs"]
mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{jpeg_bytes, multipart_body, multipart_content_type, png_bytes, test_settings, Part};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use vton_swap_gateway::api::routes::create_router;
use vton_swap_gateway::config::AppEnvironment;
use vton_swap_gateway::AppState;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn post_swap(state: AppState, parts: &[Part<'_>]) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/clothes-swap")
        .header("content-type", multipart_content_type())
        .body(Body::from(multipart_body(parts)))
        .unwrap();

    let response = create_router(Arc::new(state)).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_demo_scenario_without_credential() {
    let person = jpeg_bytes(2 * 1024);
    let parts = [
        Part::file("person", "person.jpg", "image/jpeg", person.clone()),
        Part::file("clothes", "garment.png", "image/png", png_bytes(3 * 1024)),
    ];

    let state = AppState::from_settings(test_settings(AppEnvironment::Production)).unwrap();
    let (status, body) = post_swap(state, &parts).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["service"], "Demo Mode");
    assert_eq!(
        body["result_url"],
        format!("data:image/jpeg;base64,{}", STANDARD.encode(&person))
    );

    let steps = body["setup_instructions"].as_object().unwrap();
    assert_eq!(steps.len(), 4);
    for key in ["step1", "step2", "step3", "step4"] {
        assert!(steps[key].is_string());
    }
    assert!(body["processing_time"].as_u64().is_some());
    assert!(body.get("model").is_none());
}

#[tokio::test]
async fn test_real_scenario_against_mock_replicate() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/predictions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "flow-1",
            "status": "processing"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/predictions/flow-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "flow-1",
            "status": "succeeded",
            "output": ["https://replicate.delivery/flow-1/out.jpg"]
        })))
        .mount(&server)
        .await;

    let mut settings = test_settings(AppEnvironment::Production);
    settings.replicate.api_token = Some("r8_flow".to_string());
    settings.replicate.base_url = server.uri();
    settings.replicate.poll_interval_ms = 10;

    let parts = [
        Part::file("person", "person.jpg", "image/jpeg", jpeg_bytes(2048)),
        Part::file("clothes", "garment.png", "image/png", png_bytes(3072)),
        Part::text("model", "OUTFIT_ANYONE"),
    ];

    let (status, body) = post_swap(AppState::from_settings(settings).unwrap(), &parts).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "Replicate AI");
    assert_eq!(body["model"], "Outfit Anyone");
    assert_eq!(body["result_url"], "https://replicate.delivery/flow-1/out.jpg");
    assert!(body.get("setup_instructions").is_none());
}

#[tokio::test]
async fn test_replicate_outage_degrades_to_simulation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/predictions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = test_settings(AppEnvironment::Development);
    settings.replicate.api_token = Some("r8_flow".to_string());
    settings.replicate.base_url = server.uri();

    let parts = [
        Part::file("person", "person.webp", "image/webp", vec![0x52; 512]),
        Part::file("clothes", "garment.jpg", "image/jpeg", jpeg_bytes(512)),
    ];

    let (status, body) = post_swap(AppState::from_settings(settings).unwrap(), &parts).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["service"], "Simulation Mode");
    assert!(body["result_url"]
        .as_str()
        .unwrap()
        .starts_with("data:image/webp;base64,"));
    assert!(body["error_details"]
        .as_str()
        .unwrap()
        .contains("upstream unavailable"));
}
