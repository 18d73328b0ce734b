//! Replicate client tests against a mock HTTP server

use serde_json::json;
use vton_swap_gateway::backend::{ModelHost, PredictionStatus, ReplicateBackend, TryOnInput};
use vton_swap_gateway::config::ReplicateConfig;
use vton_swap_gateway::error::AppError;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VERSION: &str = "c871bb9b046607b680449ecbae55fd8c6d945e0a1948644bf2361b3d021d3ff4";

fn model_ref() -> String {
    format!("cuuupid/idm-vton:{}", VERSION)
}

fn backend(server: &MockServer) -> ReplicateBackend {
    let config = ReplicateConfig {
        api_token: Some("r8_test_token".to_string()),
        base_url: server.uri(),
        timeout_ms: 5000,
        poll_interval_ms: 10,
    };
    ReplicateBackend::new(&config).unwrap()
}

fn input() -> TryOnInput {
    TryOnInput {
        human_img: "data:image/jpeg;base64,AAAA".to_string(),
        garm_img: "data:image/png;base64,BBBB".to_string(),
        garment_des: "A piece of clothing to try on".to_string(),
        is_checked: true,
        is_checked_crop: false,
        denoise_steps: 30,
        seed: 1234,
    }
}

#[tokio::test]
async fn test_run_sends_versioned_prediction() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/predictions"))
        .and(header("Authorization", "Bearer r8_test_token"))
        .and(header("Prefer", "wait"))
        .and(body_partial_json(json!({
            "version": VERSION,
            "input": {
                "human_img": "data:image/jpeg;base64,AAAA",
                "garm_img": "data:image/png;base64,BBBB",
                "garment_des": "A piece of clothing to try on",
                "is_checked": true,
                "is_checked_crop": false,
                "denoise_steps": 30,
                "seed": 1234
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "p1",
            "status": "succeeded",
            "output": "https://replicate.delivery/p1/out.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = backend(&server).run(&model_ref(), &input()).await.unwrap();
    assert_eq!(
        output.first_image_ref().unwrap(),
        "https://replicate.delivery/p1/out.png"
    );
}

#[tokio::test]
async fn test_run_polls_until_terminal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/predictions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "p2",
            "status": "starting",
            "urls": {
                "get": format!("{}/v1/predictions/p2", server.uri()),
                "cancel": format!("{}/v1/predictions/p2/cancel", server.uri())
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/predictions/p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p2",
            "status": "succeeded",
            "output": ["https://replicate.delivery/p2/a.png", "https://replicate.delivery/p2/b.png"],
            "metrics": {"predict_time": 12.5}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = backend(&server).run(&model_ref(), &input()).await.unwrap();
    assert_eq!(
        output.first_image_ref().unwrap(),
        "https://replicate.delivery/p2/a.png"
    );
}

#[tokio::test]
async fn test_run_unversioned_model_uses_model_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/models/levihsu/ootdiffusion/predictions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "p3",
            "status": "succeeded",
            "output": "https://replicate.delivery/p3.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = backend(&server)
        .run("levihsu/ootdiffusion", &input())
        .await
        .unwrap();
    assert_eq!(output.first_image_ref().unwrap(), "https://replicate.delivery/p3.png");
}

#[tokio::test]
async fn test_failed_prediction_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/predictions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "p4",
            "status": "failed",
            "error": "CUDA out of memory"
        })))
        .mount(&server)
        .await;

    let err = backend(&server).run(&model_ref(), &input()).await.unwrap_err();
    match err {
        AppError::PredictionFailed { id, status, message } => {
            assert_eq!(id, "p4");
            assert_eq!(status, "failed");
            assert_eq!(message, "CUDA out of memory");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_success_status_is_backend_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/predictions"))
        .respond_with(ResponseTemplate::new(402).set_body_string("Payment required"))
        .mount(&server)
        .await;

    let err = backend(&server).run(&model_ref(), &input()).await.unwrap_err();
    assert!(matches!(err, AppError::Backend(ref m) if m.contains("Payment required")));
}

#[tokio::test]
async fn test_unparseable_body_is_malformed_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/predictions"))
        .respond_with(ResponseTemplate::new(201).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = backend(&server).run(&model_ref(), &input()).await.unwrap_err();
    assert!(matches!(err, AppError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_get_and_cancel_prediction() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/predictions/p5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p5",
            "status": "processing",
            "logs": "step 3/30"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/predictions/p5/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p5",
            "status": "canceled"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend(&server);

    let prediction = backend.get_prediction("p5").await.unwrap();
    assert_eq!(prediction.status, PredictionStatus::Processing);
    assert_eq!(prediction.logs.as_deref(), Some("step 3/30"));

    backend.cancel_prediction("p5").await.unwrap();
}

#[tokio::test]
async fn test_escaping_prediction_id_never_reaches_upstream() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "x",
            "status": "starting"
        })))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let backend = backend(&server);
    let id = "../deployments/acme/prod/predictions?x=";

    let err = backend.cancel_prediction(id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidRequest(_)));

    let err = backend.get_prediction(id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidRequest(_)));
}
