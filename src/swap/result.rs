//! The response envelope returned for every swap

use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

use crate::backend::ModelDescriptor;
use crate::error::AppError;

/// Which execution path produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ServicePath {
    /// The hosted model ran
    #[serde(rename = "Replicate AI")]
    Real,
    /// No credential configured
    #[serde(rename = "Demo Mode")]
    Demo,
    /// Credential configured but the model call failed
    #[serde(rename = "Simulation Mode")]
    SimulatedFallback,
}

impl ServicePath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServicePath::Real => "Replicate AI",
            ServicePath::Demo => "Demo Mode",
            ServicePath::SimulatedFallback => "Simulation Mode",
        }
    }
}

impl std::fmt::Display for ServicePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Onboarding steps returned in demo mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SetupInstructions {
    pub step1: String,
    pub step2: String,
    pub step3: String,
    pub step4: String,
}

impl SetupInstructions {
    pub fn replicate() -> Self {
        Self {
            step1: "Visit https://replicate.com and create an account".to_string(),
            step2: "Get an API token".to_string(),
            step3: "Create a .env file and add: REPLICATE_API_TOKEN=your_token_here".to_string(),
            step4: "Restart the server".to_string(),
        }
    }

    /// Steps in order
    pub fn steps(&self) -> [&str; 4] {
        [&self.step1, &self.step2, &self.step3, &self.step4]
    }
}

/// Result of one swap request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SwapResult {
    pub success: bool,
    /// Result image: a URL from the model host, or a data URI on simulated paths
    pub result_url: String,
    /// Wall-clock milliseconds from request start to this envelope
    pub processing_time: u64,
    pub service: ServicePath,
    /// Display name of the model, on the real path only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub message: String,
    /// Present in demo mode only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_instructions: Option<SetupInstructions>,
    /// Underlying model host error; fallback path in development only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

/// How a dispatch ended. Every variant maps to exactly one envelope shape.
#[derive(Debug)]
pub enum DispatchOutcome {
    Demo,
    Real {
        model: &'static ModelDescriptor,
        result_url: String,
    },
    Fallback {
        error: AppError,
    },
}

impl DispatchOutcome {
    pub fn service(&self) -> ServicePath {
        match self {
            DispatchOutcome::Demo => ServicePath::Demo,
            DispatchOutcome::Real { .. } => ServicePath::Real,
            DispatchOutcome::Fallback { .. } => ServicePath::SimulatedFallback,
        }
    }

    /// Build the envelope.
    ///
    /// `passthrough` is the person image data URI used by the simulated paths.
    pub fn into_result(self, passthrough: String, elapsed: Duration, expose_errors: bool) -> SwapResult {
        let processing_time = elapsed.as_millis().min(u64::MAX as u128) as u64;
        let service = self.service();

        match self {
            DispatchOutcome::Demo => SwapResult {
                success: true,
                result_url: passthrough,
                processing_time,
                service,
                model: None,
                message: "Running in demo mode. Set the REPLICATE_API_TOKEN environment variable to enable real AI clothes swapping.".to_string(),
                setup_instructions: Some(SetupInstructions::replicate()),
                error_details: None,
            },
            DispatchOutcome::Real { model, result_url } => SwapResult {
                success: true,
                result_url,
                processing_time,
                service,
                model: Some(model.name.to_string()),
                message: format!("AI clothes swap complete using the {} model.", model.name),
                setup_instructions: None,
                error_details: None,
            },
            DispatchOutcome::Fallback { error } => SwapResult {
                success: true,
                result_url: passthrough,
                processing_time,
                service,
                model: None,
                message: "Running in simulation mode. The Replicate API is temporarily unavailable; check the API token or network connection.".to_string(),
                setup_instructions: None,
                error_details: expose_errors.then(|| error.to_string()),
            },
        }
    }
}
