//! Swap requests and their validation

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use std::time::Instant;
use thiserror::Error;
use utoipa::ToSchema;

use crate::error::AppError;

/// MIME types accepted for both images
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// Per-image size ceiling (10 MiB)
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Garment description used when the caller gives none
pub const DEFAULT_GARMENT_DESCRIPTION: &str = "A piece of clothing to try on";

pub const DEFAULT_DENOISE_STEPS: u32 = 30;

/// Why a request was rejected
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Both a person photo and a garment image are required (missing '{0}')")]
    MissingField(&'static str),

    #[error("Unsupported format '{content_type}' for '{field}'; only JPEG, PNG and WebP are supported")]
    UnsupportedFormat {
        field: &'static str,
        content_type: String,
    },

    #[error("'{field}' is too large ({size} bytes or more); images must not exceed 10 MB")]
    TooLarge { field: &'static str, size: usize },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

impl ValidationError {
    /// Stable machine-readable reason
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MissingField(_) => "missing_field",
            ValidationError::UnsupportedFormat { .. } => "unsupported_format",
            ValidationError::TooLarge { .. } => "too_large",
            ValidationError::InvalidSettings(_) => "invalid_settings",
        }
    }
}

/// An uploaded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.content_type, STANDARD.encode(&self.bytes))
    }

    fn check(&self, field: &'static str) -> Result<(), ValidationError> {
        let mime = self.content_type.trim().to_ascii_lowercase();
        if !ALLOWED_IMAGE_TYPES.contains(&mime.as_str()) {
            return Err(ValidationError::UnsupportedFormat {
                field,
                content_type: self.content_type.clone(),
            });
        }

        if self.size() > MAX_IMAGE_BYTES {
            return Err(ValidationError::TooLarge {
                field,
                size: self.size(),
            });
        }

        Ok(())
    }
}

/// Generation parameters, as sent in the `settings` form field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SwapSettings {
    /// Denoising steps (default 30)
    #[serde(default)]
    pub denoise_steps: Option<u32>,
    /// Random seed (default: random)
    #[serde(default)]
    pub seed: Option<i64>,
    /// Default true
    #[serde(default)]
    pub is_checked: Option<bool>,
    /// Default false
    #[serde(default)]
    pub is_checked_crop: Option<bool>,
    #[serde(default)]
    pub garment_description: Option<String>,
}

impl SwapSettings {
    /// Parse the JSON `settings` field; a missing or blank field means defaults.
    ///
    /// Broken JSON is `MalformedSettings`. Well-formed JSON with a value of the
    /// wrong type or out of range is a validation error.
    pub fn from_json(raw: Option<&str>) -> Result<Self, AppError> {
        let Some(json) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Self::default());
        };

        serde_json::from_str(json).map_err(|e| match e.classify() {
            Category::Data => ValidationError::InvalidSettings(e.to_string()).into(),
            _ => AppError::MalformedSettings(e),
        })
    }
}

/// One incoming swap call
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub person: Option<ImagePayload>,
    pub garment: Option<ImagePayload>,
    pub model: Option<String>,
    pub description: Option<String>,
    pub settings: SwapSettings,
    received_at: Instant,
}

impl SwapRequest {
    /// Start a request; the processing clock starts here
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started_at(received_at: Instant) -> Self {
        Self {
            person: None,
            garment: None,
            model: None,
            description: None,
            settings: SwapSettings::default(),
            received_at,
        }
    }

    pub fn with_person(mut self, image: ImagePayload) -> Self {
        self.person = Some(image);
        self
    }

    pub fn with_garment(mut self, image: ImagePayload) -> Self {
        self.garment = Some(image);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_settings(mut self, settings: SwapSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn received_at(&self) -> Instant {
        self.received_at
    }
}

impl Default for SwapRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// A request whose images passed validation
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub person: ImagePayload,
    pub garment: ImagePayload,
    pub model: Option<String>,
    pub garment_description: String,
    pub denoise_steps: u32,
    pub seed: Option<i64>,
    pub is_checked: bool,
    pub is_checked_crop: bool,
    received_at: Instant,
}

impl ValidatedRequest {
    pub fn received_at(&self) -> Instant {
        self.received_at
    }
}

/// Check both images and resolve parameter defaults.
///
/// A zero-byte upload counts as missing. The person image is checked first.
pub fn validate(request: SwapRequest) -> Result<ValidatedRequest, ValidationError> {
    let person = request
        .person
        .filter(|p| !p.bytes.is_empty())
        .ok_or(ValidationError::MissingField("person"))?;
    let garment = request
        .garment
        .filter(|g| !g.bytes.is_empty())
        .ok_or(ValidationError::MissingField("clothes"))?;

    person.check("person")?;
    garment.check("clothes")?;

    let settings = request.settings;
    let garment_description = request
        .description
        .or(settings.garment_description)
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| DEFAULT_GARMENT_DESCRIPTION.to_string());

    Ok(ValidatedRequest {
        person,
        garment,
        model: request.model,
        garment_description,
        denoise_steps: settings.denoise_steps.unwrap_or(DEFAULT_DENOISE_STEPS),
        seed: settings.seed,
        is_checked: settings.is_checked.unwrap_or(true),
        is_checked_crop: settings.is_checked_crop.unwrap_or(false),
        received_at: request.received_at,
    })
}
