use std::time::Duration;

use crate::{config::ConfigError, retry::RetryPolicy};

pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY"];
pub const DEFAULT_MODEL: &str = "models/gemini-2.5-flash";

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_base: String,
    pub upload_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
    /// Retry policy for transient failures (429, 5xx, timeouts)
    pub retry: RetryPolicy,
    /// Delay between state checks while an upload is processed
    pub upload_poll_interval: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            upload_url: "https://generativelanguage.googleapis.com/upload/v1beta/files".to_string(),
            model: normalize_model(model.into()),
            api_key: api_key.into(),
            timeout: Duration::from_secs(300),
            retry: RetryPolicy::new(3, Duration::from_secs(2)),
            upload_poll_interval: Duration::from_secs(2),
        }
    }

    /// Reads the API key from the environment (`GEMINI_API_KEY`, then `GOOGLE_API_KEY`).
    pub fn from_env(model: impl Into<String>) -> Result<Self, ConfigError> {
        let api_key = validate_api_key()?;
        Ok(Self::new(api_key, model))
    }

    pub fn generate_url(&self) -> String {
        format!("{}/{}:generateContent", self.api_base, self.model)
    }

    pub fn file_url(&self, name: &str) -> String {
        format!("{}/{}", self.api_base, name)
    }
}

/// Validate that an API key is set
pub fn validate_api_key() -> Result<String, ConfigError> {
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|key| !key.trim().is_empty())
        .ok_or(ConfigError::MissingApiKey {
            env_vars: API_KEY_ENV_VARS,
        })
}

fn normalize_model(model: String) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model
    } else {
        format!("models/{model}")
    }
}
