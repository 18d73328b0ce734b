//! Configuration status of the external services the UI can use

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{
    non_blank, Settings, HUGGING_FACE_TOKEN_ENV, OPENAI_KEY_ENV, REMOVE_BG_KEY_ENV,
    REPLICATE_TOKEN_ENV,
};

/// Static description of an external service
#[derive(Debug, Clone, Copy)]
pub struct ServiceDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    /// Environment variable holding the credential
    pub credential_env: &'static str,
    /// Where the credential lives once settings are loaded
    pub credential: fn(&Settings) -> &Option<String>,
    pub description: &'static str,
    pub features: &'static [&'static str],
    pub pricing: &'static str,
    pub setup_url: &'static str,
    /// Free allowance; `None` for paid-only services
    pub free_tier: Option<&'static str>,
}

pub static SERVICES: [ServiceDescriptor; 4] = [
    ServiceDescriptor {
        id: "replicate",
        name: "Replicate AI",
        credential_env: REPLICATE_TOKEN_ENV,
        credential: replicate_token,
        description: "Hosted AI model platform for face swap, clothes swap and more",
        features: &["Face Swap", "Clothes Swap", "Video Processing", "Super Resolution"],
        pricing: "Pay per use",
        setup_url: "https://replicate.com",
        free_tier: None,
    },
    ServiceDescriptor {
        id: "remove_bg",
        name: "Remove.bg",
        credential_env: REMOVE_BG_KEY_ENV,
        credential: remove_bg_key,
        description: "Background removal service",
        features: &["Background Removal", "High Quality", "API Integration"],
        pricing: "50 free calls per month, paid unlimited",
        setup_url: "https://www.remove.bg/api",
        free_tier: Some("50 calls/month"),
    },
    ServiceDescriptor {
        id: "hugging_face",
        name: "Hugging Face",
        credential_env: HUGGING_FACE_TOKEN_ENV,
        credential: hugging_face_token,
        description: "Open source AI model platform",
        features: &["Photo Enhancement", "Real-ESRGAN", "GFPGAN", "Various Models"],
        pricing: "Free quota",
        setup_url: "https://huggingface.co/settings/tokens",
        free_tier: Some("Free usage quota"),
    },
    ServiceDescriptor {
        id: "openai",
        name: "OpenAI DALL-E",
        credential_env: OPENAI_KEY_ENV,
        credential: openai_key,
        description: "Image generation and editing",
        features: &["Image Generation", "Image Editing", "Variations"],
        pricing: "Pay per use",
        setup_url: "https://platform.openai.com/api-keys",
        free_tier: None,
    },
];

fn replicate_token(settings: &Settings) -> &Option<String> {
    &settings.replicate.api_token
}

fn remove_bg_key(settings: &Settings) -> &Option<String> {
    &settings.credentials.remove_bg_api_key
}

fn hugging_face_token(settings: &Settings) -> &Option<String> {
    &settings.credentials.hugging_face_api_token
}

fn openai_key(settings: &Settings) -> &Option<String> {
    &settings.credentials.openai_api_key
}

impl ServiceDescriptor {
    pub fn is_configured(&self, settings: &Settings) -> bool {
        non_blank((self.credential)(settings)).is_some()
    }
}

/// One service in the status report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceStatus {
    pub id: String,
    pub name: String,
    pub configured: bool,
    pub description: String,
    pub features: Vec<String>,
    pub pricing: String,
    pub setup_url: String,
    pub free_tier: Option<String>,
}

/// Overall configuration level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Good,
    Partial,
    DemoMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OverallSummary {
    pub configured_services: usize,
    pub total_services: usize,
    pub configuration_percentage: u32,
    pub status: OverallStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FreeService {
    pub id: String,
    pub name: String,
    pub free_tier: String,
    pub setup_url: String,
}

/// Full status report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusReport {
    pub overall: OverallSummary,
    pub services: Vec<ServiceStatus>,
    pub free_services: Vec<FreeService>,
}

/// Build the report for the current settings
pub fn report(settings: &Settings) -> StatusReport {
    let services: Vec<ServiceStatus> = SERVICES
        .iter()
        .map(|s| ServiceStatus {
            id: s.id.to_string(),
            name: s.name.to_string(),
            configured: s.is_configured(settings),
            description: s.description.to_string(),
            features: s.features.iter().map(|f| f.to_string()).collect(),
            pricing: s.pricing.to_string(),
            setup_url: s.setup_url.to_string(),
            free_tier: s.free_tier.map(String::from),
        })
        .collect();

    let configured = services.iter().filter(|s| s.configured).count();
    let total = services.len();
    let percentage = if total == 0 {
        0
    } else {
        ((configured as f64 / total as f64) * 100.0).round() as u32
    };

    let status = if percentage > 50 {
        OverallStatus::Good
    } else if percentage > 0 {
        OverallStatus::Partial
    } else {
        OverallStatus::DemoMode
    };

    let free_services = SERVICES
        .iter()
        .filter_map(|s| {
            s.free_tier.map(|tier| FreeService {
                id: s.id.to_string(),
                name: s.name.to_string(),
                free_tier: tier.to_string(),
                setup_url: s.setup_url.to_string(),
            })
        })
        .collect();

    StatusReport {
        overall: OverallSummary {
            configured_services: configured,
            total_services: total,
            configuration_percentage: percentage,
            status,
        },
        services,
        free_services,
    }
}
