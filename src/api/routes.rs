//! HTTP route definitions

use crate::api::handlers;
use crate::api::models::*;
use crate::backend::{
    traits::{PredictionMetrics, PredictionUrls},
    Prediction, PredictionStatus,
};
use crate::status::{FreeService, OverallStatus, OverallSummary, ServiceStatus, StatusReport};
use crate::swap::{ServicePath, SetupInstructions, SwapResult, SwapSettings};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Virtual Try-On Swap Gateway API",
        version = "0.1.0",
        description = "Dispatches clothes swap requests to hosted try-on models, with demo and simulation fallbacks.",
        license(name = "MIT"),
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        handlers::clothes_swap,
        handlers::swap_status,
        handlers::services_status,
        handlers::list_models,
        handlers::get_prediction,
        handlers::cancel_prediction,
        handlers::health_check,
    ),
    components(schemas(
        SwapForm,
        SwapSettings,
        SwapResult,
        ServicePath,
        SetupInstructions,
        SwapRouteStatus,
        AiServiceStatus,
        ReplicateServiceStatus,
        SetupGuide,
        ServicesStatusResponse,
        StatusReport,
        OverallSummary,
        OverallStatus,
        ServiceStatus,
        FreeService,
        ModelInfo,
        ModelListResponse,
        Prediction,
        PredictionStatus,
        PredictionUrls,
        PredictionMetrics,
        HealthResponse,
        SuccessResponse,
    )),
    tags(
        (name = "Swap", description = "Clothes swap endpoints"),
        (name = "Models", description = "Try-on model registry"),
        (name = "Predictions", description = "Model host prediction management"),
        (name = "Status", description = "External service configuration"),
        (name = "Health", description = "Health endpoints"),
    )
)]
pub struct ApiDoc;

/// Create the main application router
pub fn create_router(state: Arc<crate::AppState>) -> Router {
    let server = state.settings.server.clone();

    let api_routes = Router::new()
        .route(
            "/clothes-swap",
            post(handlers::clothes_swap).get(handlers::swap_status),
        )
        .route("/status", get(handlers::services_status))
        .route("/models", get(handlers::list_models))
        .route("/predictions/:id", get(handlers::get_prediction))
        .route("/predictions/:id/cancel", post(handlers::cancel_prediction))
        .layer(DefaultBodyLimit::max(server.body_limit_bytes));

    let router = Router::new()
        .route("/health", get(handlers::health_check))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs)));

    let router = if server.cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http())
}
