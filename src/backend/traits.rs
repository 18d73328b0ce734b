//! Model host trait and prediction types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{AppError, Result};

/// Input object sent to a try-on model.
///
/// Field names are the ones the hosted try-on models expect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TryOnInput {
    pub human_img: String,
    pub garm_img: String,
    pub garment_des: String,
    pub is_checked: bool,
    pub is_checked_crop: bool,
    pub denoise_steps: u32,
    pub seed: i64,
}

/// Lifecycle state of a prediction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PredictionStatus::Succeeded | PredictionStatus::Failed | PredictionStatus::Canceled
        )
    }
}

impl std::fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictionStatus::Starting => write!(f, "starting"),
            PredictionStatus::Processing => write!(f, "processing"),
            PredictionStatus::Succeeded => write!(f, "succeeded"),
            PredictionStatus::Failed => write!(f, "failed"),
            PredictionStatus::Canceled => write!(f, "canceled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PredictionUrls {
    #[serde(default)]
    pub get: Option<String>,
    #[serde(default)]
    pub cancel: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PredictionMetrics {
    #[serde(default)]
    pub predict_time: Option<f64>,
}

/// A prediction as reported by the model host
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<PredictionUrls>,
    /// Model output: an image URL or a list of them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub error: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<PredictionMetrics>,
}

impl Prediction {
    /// Human readable failure reason, if the host reported one
    pub fn error_message(&self) -> String {
        match &self.error {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "no error detail reported".to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// Raw output of a successful prediction
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput(pub Value);

impl ModelOutput {
    /// Image reference carried by the output: the string itself, or the
    /// first element when the model returned a list.
    pub fn first_image_ref(&self) -> Result<String> {
        match &self.0 {
            Value::String(url) if !url.is_empty() => Ok(url.clone()),
            Value::Array(items) => match items.first() {
                Some(Value::String(url)) if !url.is_empty() => Ok(url.clone()),
                Some(other) => Err(AppError::MalformedResponse(format!(
                    "first output element is not an image reference: {}",
                    other
                ))),
                None => Err(AppError::MalformedResponse(
                    "model returned an empty output list".to_string(),
                )),
            },
            other => Err(AppError::MalformedResponse(format!(
                "unexpected model output: {}",
                other
            ))),
        }
    }
}

/// Reject prediction ids that could escape their URL path segment.
///
/// Hosts mint ids from ASCII letters, digits, `-` and `_`; anything else is
/// refused before a request carrying the credential is built.
pub fn check_prediction_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

    if valid {
        Ok(())
    } else {
        Err(AppError::InvalidRequest(format!(
            "Invalid prediction id '{}'",
            id
        )))
    }
}

/// A hosted model service that can run try-on predictions
#[async_trait]
pub trait ModelHost: Send + Sync {
    /// Host name, used in logs
    fn name(&self) -> &str;

    /// Run a model to completion and return its output
    async fn run(&self, model_ref: &str, input: &TryOnInput) -> Result<ModelOutput>;

    /// Fetch the current state of a prediction
    async fn get_prediction(&self, id: &str) -> Result<Prediction>;

    /// Cancel an in-flight prediction
    async fn cancel_prediction(&self, id: &str) -> Result<()>;
}
