//! Virtual Try-On Swap Gateway
//!
//! An HTTP gateway that accepts a person photo and a garment photo, runs a
//! hosted try-on model when one is configured, and degrades to a demo or
//! simulated result when it is not or when the model call fails.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod status;
pub mod swap;

pub use error::{AppError, Result};

use std::sync::Arc;
use tracing::info;

use backend::{ModelHost, ModelRegistry, ReplicateBackend};
use swap::{DispatcherOptions, SwapDispatcher};

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub dispatcher: Arc<SwapDispatcher>,
}

impl AppState {
    /// Build state from settings, creating the Replicate client when a credential is present
    pub fn from_settings(settings: config::Settings) -> Result<Self> {
        let host: Option<Arc<dyn ModelHost>> = if settings.replicate_configured() {
            info!("Replicate credential found, real model calls enabled");
            Some(Arc::new(ReplicateBackend::new(&settings.replicate)?))
        } else {
            info!("No Replicate credential configured, running in demo mode");
            None
        };

        Ok(Self::with_host(settings, host))
    }

    /// Build state around an explicit model host (or none)
    pub fn with_host(settings: config::Settings, host: Option<Arc<dyn ModelHost>>) -> Self {
        let options = DispatcherOptions::from_settings(&settings);
        let dispatcher = SwapDispatcher::new(host, ModelRegistry::new(), options);

        Self {
            settings: Arc::new(settings),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// The configured model host, or `NotConfigured`
    pub fn model_host(&self) -> Result<&Arc<dyn ModelHost>> {
        self.dispatcher.host().ok_or_else(|| {
            AppError::NotConfigured("REPLICATE_API_TOKEN is not set".to_string())
        })
    }
}
