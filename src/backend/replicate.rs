//! Replicate prediction API client

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Response,
};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::backend::traits::{
    check_prediction_id, ModelHost, ModelOutput, Prediction, PredictionStatus, TryOnInput,
};
use crate::config::ReplicateConfig;
use crate::error::{AppError, Result};

/// Body for `POST /v1/predictions` (pinned model version)
#[derive(Debug, Serialize)]
struct VersionedPredictionRequest<'a> {
    version: &'a str,
    input: &'a TryOnInput,
}

/// Body for `POST /v1/models/{owner}/{name}/predictions` (latest version)
#[derive(Debug, Serialize)]
struct ModelPredictionRequest<'a> {
    input: &'a TryOnInput,
}

/// A model reference split into its parts: `owner/name[:version]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub version: Option<&'a str>,
}

impl<'a> ModelRef<'a> {
    pub fn parse(reference: &'a str) -> Result<Self> {
        let (path, version) = match reference.split_once(':') {
            Some((path, version)) if !version.is_empty() => (path, Some(version)),
            Some(_) => {
                return Err(AppError::Internal(format!(
                    "Model reference '{}' has an empty version",
                    reference
                )))
            }
            None => (reference, None),
        };

        match path.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner,
                name,
                version,
            }),
            _ => Err(AppError::Internal(format!(
                "Model reference '{}' is not of the form owner/name[:version]",
                reference
            ))),
        }
    }
}

/// Replicate-hosted models
pub struct ReplicateBackend {
    client: Client,
    base_url: String,
    api_token: String,
    poll_interval: Duration,
}

impl ReplicateBackend {
    /// Create a client from configuration. Fails when no credential is set.
    pub fn new(config: &ReplicateConfig) -> Result<Self> {
        let api_token = config
            .credential()
            .ok_or_else(|| AppError::NotConfigured("REPLICATE_API_TOKEN is not set".to_string()))?
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.api_token)) {
            headers.insert(AUTHORIZATION, value);
        }

        headers
    }

    async fn create_prediction(&self, model_ref: &str, input: &TryOnInput) -> Result<Prediction> {
        let model = ModelRef::parse(model_ref)?;

        let request = match model.version {
            Some(version) => self
                .client
                .post(format!("{}/v1/predictions", self.base_url))
                .json(&VersionedPredictionRequest { version, input }),
            None => self
                .client
                .post(format!(
                    "{}/v1/models/{}/{}/predictions",
                    self.base_url, model.owner, model.name
                ))
                .json(&ModelPredictionRequest { input }),
        };

        let response = request
            .headers(self.get_headers())
            .header("Prefer", "wait")
            .send()
            .await?;

        self.parse_prediction(response).await
    }

    async fn parse_prediction(&self, response: Response) -> Result<Prediction> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Backend(format!(
                "Replicate returned {}: {}",
                status, body
            )));
        }

        response.json::<Prediction>().await.map_err(|e| {
            error!(error = %e, "Failed to parse prediction response");
            AppError::MalformedResponse(format!("Failed to parse prediction: {}", e))
        })
    }

    /// Poll until the prediction reaches a terminal state
    async fn wait_for(&self, mut prediction: Prediction) -> Result<Prediction> {
        while !prediction.status.is_terminal() {
            debug!(id = %prediction.id, status = %prediction.status, "Waiting for prediction");
            tokio::time::sleep(self.poll_interval).await;
            prediction = self.get_prediction(&prediction.id).await?;
        }

        Ok(prediction)
    }
}

#[async_trait]
impl ModelHost for ReplicateBackend {
    fn name(&self) -> &str {
        "replicate"
    }

    async fn run(&self, model_ref: &str, input: &TryOnInput) -> Result<ModelOutput> {
        debug!(model = %model_ref, seed = input.seed, "Creating prediction");

        let created = self.create_prediction(model_ref, input).await?;
        let prediction = self.wait_for(created).await?;

        match prediction.status {
            PredictionStatus::Succeeded => {
                info!(
                    id = %prediction.id,
                    predict_time = ?prediction.metrics.as_ref().and_then(|m| m.predict_time),
                    "Prediction succeeded"
                );
                let output = prediction.output.ok_or_else(|| {
                    AppError::MalformedResponse(format!(
                        "Prediction {} succeeded without output",
                        prediction.id
                    ))
                })?;
                Ok(ModelOutput(output))
            }
            status => Err(AppError::PredictionFailed {
                message: prediction.error_message(),
                id: prediction.id,
                status: status.to_string(),
            }),
        }
    }

    async fn get_prediction(&self, id: &str) -> Result<Prediction> {
        check_prediction_id(id)?;

        let response = self
            .client
            .get(format!("{}/v1/predictions/{}", self.base_url, id))
            .headers(self.get_headers())
            .send()
            .await?;

        self.parse_prediction(response).await
    }

    async fn cancel_prediction(&self, id: &str) -> Result<()> {
        check_prediction_id(id)?;

        let response = self
            .client
            .post(format!("{}/v1/predictions/{}/cancel", self.base_url, id))
            .headers(self.get_headers())
            .send()
            .await?;

        if response.status().is_success() {
            info!(id = %id, "Prediction canceled");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AppError::Backend(format!(
                "Replicate returned {}: {}",
                status, body
            )))
        }
    }
}
