//! API request and response models

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::backend::ModelDescriptor;
use crate::status::StatusReport;
use crate::swap::SetupInstructions;

/// Multipart form accepted by `POST /api/clothes-swap`
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct SwapForm {
    /// Person photo (JPEG, PNG or WebP, at most 10 MB)
    #[schema(value_type = String, format = Binary)]
    pub person: Vec<u8>,
    /// Garment photo (JPEG, PNG or WebP, at most 10 MB)
    #[schema(value_type = String, format = Binary)]
    pub clothes: Vec<u8>,
    /// Model selector: IDM_VTON, OUTFIT_ANYONE or VIRTUAL_TRYON
    pub model: Option<String>,
    /// Garment description
    pub description: Option<String>,
    /// JSON-encoded generation settings
    pub settings: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReplicateServiceStatus {
    pub configured: bool,
    /// "ready" or "needs_configuration"
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AiServiceStatus {
    pub replicate: ReplicateServiceStatus,
}

/// Either a ready message or the onboarding steps
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum SetupGuide {
    Ready(String),
    Steps(SetupInstructions),
}

/// `GET /api/clothes-swap`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SwapRouteStatus {
    pub status: String,
    pub message: String,
    pub timestamp: String,
    pub ai_service: AiServiceStatus,
    pub supported_methods: Vec<String>,
    pub required_fields: Vec<String>,
    pub supported_formats: Vec<String>,
    pub max_file_size: String,
    pub setup_guide: SetupGuide,
}

/// `GET /api/status`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServicesStatusResponse {
    pub status: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub report: StatusReport,
}

/// Model information for the listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelInfo {
    pub key: String,
    pub name: String,
    pub reference: String,
    pub description: String,
    pub max_resolution: u32,
    pub processing_time: String,
    pub features: Vec<String>,
    pub default: bool,
}

impl ModelInfo {
    pub fn from_descriptor(model: &ModelDescriptor, default: bool) -> Self {
        Self {
            key: model.key.to_string(),
            name: model.name.to_string(),
            reference: model.reference.to_string(),
            description: model.description.to_string(),
            max_resolution: model.max_resolution,
            processing_time: model.processing_time.to_string(),
            features: model.features.iter().map(|f| f.to_string()).collect(),
            default,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelListResponse {
    pub default_model: String,
    pub models: Vec<ModelInfo>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub model_host_configured: bool,
}

/// Generic success response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}
