//! HTTP request handlers

use crate::api::models::{
    AiServiceStatus, HealthResponse, ModelInfo, ModelListResponse, ReplicateServiceStatus,
    ServicesStatusResponse, SetupGuide, SuccessResponse, SwapForm, SwapRouteStatus,
};
use crate::backend::{check_prediction_id, Prediction};
use crate::error::{AppError, BoundaryError};
use crate::status;
use crate::swap::{
    ImagePayload, SetupInstructions, SwapRequest, SwapResult, SwapSettings, ValidationError,
    ALLOWED_IMAGE_TYPES,
};
use crate::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Swap the garment onto the person photo
#[utoipa::path(
    post,
    path = "/api/clothes-swap",
    tag = "Swap",
    request_body(content = SwapForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Swap result (real, demo or simulated)", body = SwapResult),
        (status = 400, description = "Missing image, unsupported format, or image too large"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn clothes_swap(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<SwapResult>, BoundaryError> {
    let expose = state.settings.environment.is_development();

    let request = read_swap_form(multipart, state.settings.server.body_limit_bytes)
        .await
        .map_err(|e| e.with_details(expose))?;

    info!(
        model = ?request.model,
        person_bytes = ?request.person.as_ref().map(ImagePayload::size),
        clothes_bytes = ?request.garment.as_ref().map(ImagePayload::size),
        "Received clothes swap request"
    );

    let result = state
        .dispatcher
        .swap(request)
        .await
        .map_err(|e| AppError::from(e).with_details(expose))?;

    Ok(Json(result))
}

/// Collect the multipart fields into a [`SwapRequest`]. Unknown fields are ignored.
async fn read_swap_form(mut multipart: Multipart, body_limit: usize) -> Result<SwapRequest, AppError> {
    let mut request = SwapRequest::new();
    let mut raw_settings: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_failure(e, "request", body_limit))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "person" | "clothes" => {
                let field_name = if name == "person" { "person" } else { "clothes" };
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_failure(e, field_name, body_limit))?;

                debug!(field = %name, content_type = %content_type, size = bytes.len(), "Received image");

                let image = ImagePayload::new(content_type, bytes.to_vec());
                if name == "person" {
                    request.person = Some(image);
                } else {
                    request.garment = Some(image);
                }
            }
            "model" | "description" | "settings" => {
                let value = field.text().await.map_err(|e| {
                    AppError::InvalidRequest(format!("Failed to read '{}': {}", name, e))
                })?;
                match name.as_str() {
                    "model" => request.model = Some(value),
                    "description" => request.description = Some(value),
                    _ => raw_settings = Some(value),
                }
            }
            other => debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    request.settings = SwapSettings::from_json(raw_settings.as_deref())?;

    Ok(request)
}

/// A body cut off at the upload limit is an oversized image, anything else a bad form
fn multipart_failure(err: MultipartError, field: &'static str, body_limit: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationError::TooLarge {
            field,
            size: body_limit,
        }
        .into()
    } else {
        AppError::InvalidRequest(format!("Failed to read '{}': {}", field, err.body_text()))
    }
}

/// Describe the swap route and whether the model host is ready
#[utoipa::path(
    get,
    path = "/api/clothes-swap",
    tag = "Swap",
    responses((status = 200, description = "Route status", body = SwapRouteStatus))
)]
pub async fn swap_status(State(state): State<Arc<AppState>>) -> Json<SwapRouteStatus> {
    let configured = state.dispatcher.is_configured();

    Json(SwapRouteStatus {
        status: "ok".to_string(),
        message: "AI Clothes Swap API is running".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        ai_service: AiServiceStatus {
            replicate: ReplicateServiceStatus {
                configured,
                status: if configured { "ready" } else { "needs_configuration" }.to_string(),
            },
        },
        supported_methods: vec!["POST".to_string()],
        required_fields: vec!["person".to_string(), "clothes".to_string()],
        supported_formats: ALLOWED_IMAGE_TYPES.iter().map(|t| t.to_string()).collect(),
        max_file_size: "10MB".to_string(),
        setup_guide: if configured {
            SetupGuide::Ready("AI service is ready!".to_string())
        } else {
            SetupGuide::Steps(SetupInstructions::replicate())
        },
    })
}

/// Report which external services are configured
#[utoipa::path(
    get,
    path = "/api/status",
    tag = "Status",
    responses((status = 200, description = "Service configuration report", body = ServicesStatusResponse))
)]
pub async fn services_status(State(state): State<Arc<AppState>>) -> Json<ServicesStatusResponse> {
    Json(ServicesStatusResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        report: status::report(&state.settings),
    })
}

/// List the available try-on models
#[utoipa::path(
    get,
    path = "/api/models",
    tag = "Models",
    responses((status = 200, description = "Registered models", body = ModelListResponse))
)]
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelListResponse> {
    let registry = state.dispatcher.registry();
    let default_key = registry.default_model().key;

    Json(ModelListResponse {
        default_model: default_key.to_string(),
        models: registry
            .list()
            .iter()
            .map(|m| ModelInfo::from_descriptor(m, m.key == default_key))
            .collect(),
    })
}

/// Fetch the state of a prediction on the model host
#[utoipa::path(
    get,
    path = "/api/predictions/{id}",
    tag = "Predictions",
    params(("id" = String, Path, description = "Prediction id")),
    responses(
        (status = 200, description = "Prediction", body = Prediction),
        (status = 400, description = "Invalid prediction id"),
        (status = 502, description = "Model host error"),
        (status = 503, description = "Model host not configured"),
    )
)]
pub async fn get_prediction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Prediction>, AppError> {
    check_prediction_id(&id)?;
    let host = state.model_host()?;
    let prediction = host.get_prediction(&id).await?;
    Ok(Json(prediction))
}

/// Cancel a prediction on the model host
#[utoipa::path(
    post,
    path = "/api/predictions/{id}/cancel",
    tag = "Predictions",
    params(("id" = String, Path, description = "Prediction id")),
    responses(
        (status = 200, description = "Prediction canceled", body = SuccessResponse),
        (status = 400, description = "Invalid prediction id"),
        (status = 502, description = "Model host error"),
        (status = 503, description = "Model host not configured"),
    )
)]
pub async fn cancel_prediction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    check_prediction_id(&id)?;
    info!(id = %id, "Canceling prediction");

    let host = state.model_host()?;
    host.cancel_prediction(&id).await?;

    Ok(Json(SuccessResponse {
        success: true,
        message: format!("Prediction '{}' canceled", id),
    }))
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.settings.environment.to_string(),
        model_host_configured: state.dispatcher.is_configured(),
    })
}
