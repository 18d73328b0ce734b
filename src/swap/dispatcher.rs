//! Per-request dispatch between the hosted model and the simulated paths

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::backend::{ModelDescriptor, ModelHost, ModelRegistry, TryOnInput};
use crate::config::Settings;
use crate::error::AppError;
use crate::swap::request::{validate, SwapRequest, ValidatedRequest, ValidationError};
use crate::swap::result::{DispatchOutcome, SwapResult};

/// Dispatcher settings taken from [`Settings`]
#[derive(Debug, Clone)]
pub struct DispatcherOptions {
    /// Bound on the whole model call
    pub call_timeout: Duration,
    /// Pause before answering on the simulated paths
    pub simulation_delay: Duration,
    /// Attach model host error text to fallback results
    pub expose_errors: bool,
}

impl DispatcherOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            call_timeout: Duration::from_millis(settings.replicate.timeout_ms),
            simulation_delay: Duration::from_millis(settings.simulation.delay_ms),
            expose_errors: settings.environment.is_development(),
        }
    }
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Turns swap requests into results.
///
/// The model host is injected at construction: `None` means no credential
/// is configured and every request is answered in demo mode.
pub struct SwapDispatcher {
    host: Option<Arc<dyn ModelHost>>,
    registry: ModelRegistry,
    options: DispatcherOptions,
}

impl SwapDispatcher {
    pub fn new(
        host: Option<Arc<dyn ModelHost>>,
        registry: ModelRegistry,
        options: DispatcherOptions,
    ) -> Self {
        Self {
            host,
            registry,
            options,
        }
    }

    /// Whether a model host is configured
    pub fn is_configured(&self) -> bool {
        self.host.is_some()
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn host(&self) -> Option<&Arc<dyn ModelHost>> {
        self.host.as_ref()
    }

    pub fn validate(&self, request: SwapRequest) -> Result<ValidatedRequest, ValidationError> {
        validate(request)
    }

    pub fn select_model(&self, selector: Option<&str>) -> &'static ModelDescriptor {
        self.registry.select(selector)
    }

    /// Validate, select a model, and dispatch
    pub async fn swap(&self, request: SwapRequest) -> Result<SwapResult, ValidationError> {
        let validated = self.validate(request)?;
        let model = self.select_model(validated.model.as_deref());
        Ok(self.dispatch(validated, model).await)
    }

    /// Run one request down exactly one path. Never fails.
    pub async fn dispatch(&self, request: ValidatedRequest, model: &'static ModelDescriptor) -> SwapResult {
        let person_uri = request.person.to_data_uri();

        let outcome = match &self.host {
            None => DispatchOutcome::Demo,
            Some(host) => match self.call_model(host.as_ref(), &request, &person_uri, model).await {
                Ok(result_url) => DispatchOutcome::Real { model, result_url },
                Err(error) => {
                    warn!(host = %host.name(), model = %model.name, error = %error, "Model call failed, falling back to simulation");
                    DispatchOutcome::Fallback { error }
                }
            },
        };

        if !matches!(outcome, DispatchOutcome::Real { .. }) && !self.options.simulation_delay.is_zero() {
            tokio::time::sleep(self.options.simulation_delay).await;
        }

        let service = outcome.service();
        let result = outcome.into_result(
            person_uri,
            request.received_at().elapsed(),
            self.options.expose_errors,
        );

        info!(
            service = %service,
            model = %model.key,
            processing_time_ms = result.processing_time,
            "Swap request completed"
        );

        result
    }

    async fn call_model(
        &self,
        host: &dyn ModelHost,
        request: &ValidatedRequest,
        person_uri: &str,
        model: &ModelDescriptor,
    ) -> Result<String, AppError> {
        let input = TryOnInput {
            human_img: person_uri.to_string(),
            garm_img: request.garment.to_data_uri(),
            garment_des: request.garment_description.clone(),
            is_checked: request.is_checked,
            is_checked_crop: request.is_checked_crop,
            denoise_steps: request.denoise_steps,
            seed: request
                .seed
                .unwrap_or_else(|| i64::from(rand::thread_rng().gen::<u32>())),
        };

        info!(host = %host.name(), model = %model.name, seed = input.seed, "Calling model host");

        let timeout_ms = self.options.call_timeout.as_millis() as u64;
        let output = tokio::time::timeout(self.options.call_timeout, host.run(model.reference, &input))
            .await
            .map_err(|_| AppError::Timeout(timeout_ms))??;

        output.first_image_ref()
    }
}
