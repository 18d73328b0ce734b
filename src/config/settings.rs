//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable holding the Replicate credential
pub const REPLICATE_TOKEN_ENV: &str = "REPLICATE_API_TOKEN";
/// Environment variable holding the remove.bg credential
pub const REMOVE_BG_KEY_ENV: &str = "REMOVE_BG_API_KEY";
/// Environment variable holding the Hugging Face credential
pub const HUGGING_FACE_TOKEN_ENV: &str = "HUGGING_FACE_API_TOKEN";
/// Environment variable holding the OpenAI credential
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub environment: AppEnvironment,
    #[serde(default)]
    pub replicate: ReplicateConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on a whole multipart body; per-image limits are checked separately
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_body_limit() -> usize {
    24 * 1024 * 1024
}

fn default_request_timeout() -> u64 {
    90
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            request_timeout_secs: default_request_timeout(),
            cors_enabled: true,
        }
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    #[default]
    Production,
}

impl AppEnvironment {
    pub fn is_development(&self) -> bool {
        matches!(self, AppEnvironment::Development)
    }
}

impl std::fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppEnvironment::Development => write!(f, "development"),
            AppEnvironment::Production => write!(f, "production"),
        }
    }
}

/// Replicate model host configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplicateConfig {
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_replicate_url")]
    pub base_url: String,
    /// Overall bound on one model call, including polling
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_replicate_url() -> String {
    "https://api.replicate.com".to_string()
}

fn default_timeout() -> u64 {
    60000
}

fn default_poll_interval() -> u64 {
    1000
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: default_replicate_url(),
            timeout_ms: default_timeout(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl ReplicateConfig {
    /// The configured credential, if any. Blank values count as absent.
    pub fn credential(&self) -> Option<&str> {
        non_blank(&self.api_token)
    }
}

/// Pacing of the simulated (demo and fallback) paths
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default = "default_simulation_delay")]
    pub delay_ms: u64,
}

fn default_simulation_delay() -> u64 {
    2000
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_simulation_delay(),
        }
    }
}

/// Credentials for services reported by the status endpoint
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub remove_bg_api_key: Option<String>,
    #[serde(default)]
    pub hugging_face_api_token: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Trimmed value, or `None` when absent or blank
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/gateway.yaml")
    }

    /// Load settings from a specific configuration file path (YAML or TOML)
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let format = if path.extension().map_or(false, |ext| ext == "yaml" || ext == "yml") {
            FileFormat::Yaml
        } else {
            FileFormat::Toml
        };

        let mut builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("environment", "production")?
            .set_default("replicate.base_url", default_replicate_url())?
            .set_default("replicate.timeout_ms", default_timeout() as i64)?
            .set_default("replicate.poll_interval_ms", default_poll_interval() as i64)?
            .set_default("simulation.delay_ms", default_simulation_delay() as i64)?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?;

        if path.exists() {
            builder = builder.add_source(File::from(path).format(format));
        }

        builder = builder.add_source(
            Environment::with_prefix("VTON_GATEWAY")
                .separator("__")
                .try_parsing(true),
        );

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        settings.apply_credentials_from(|name| std::env::var(name).ok());

        Ok(settings)
    }

    /// Fill credentials that the layered config left unset from well-known variables
    pub fn apply_credentials_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fill(&mut self.replicate.api_token, lookup(REPLICATE_TOKEN_ENV));
        fill(&mut self.credentials.remove_bg_api_key, lookup(REMOVE_BG_KEY_ENV));
        fill(
            &mut self.credentials.hugging_face_api_token,
            lookup(HUGGING_FACE_TOKEN_ENV),
        );
        fill(&mut self.credentials.openai_api_key, lookup(OPENAI_KEY_ENV));
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }

        if self.replicate.timeout_ms == 0 {
            return Err(invalid("Replicate timeout must be greater than 0"));
        }

        let fallback_budget_ms = self
            .replicate
            .timeout_ms
            .saturating_add(self.simulation.delay_ms);
        if self.server.request_timeout_secs.saturating_mul(1000) <= fallback_budget_ms {
            return Err(invalid(&format!(
                "Server request timeout ({} s) must exceed the model timeout plus simulation delay ({} ms)",
                self.server.request_timeout_secs, fallback_budget_ms
            )));
        }

        if !self.replicate.base_url.starts_with("http://")
            && !self.replicate.base_url.starts_with("https://")
        {
            return Err(invalid(&format!(
                "Replicate base URL '{}' must be http or https",
                self.replicate.base_url
            )));
        }

        Ok(())
    }

    /// Whether the Replicate credential is present
    pub fn replicate_configured(&self) -> bool {
        self.replicate.credential().is_some()
    }
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if non_blank(slot).is_none() {
        if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
            *slot = Some(v);
        }
    }
}

fn invalid(message: &str) -> AppError {
    AppError::Config(config::ConfigError::Message(message.to_string()))
}
