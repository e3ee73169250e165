use serde::{Deserialize, Serialize};

use crate::prompt::PromptStyle;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing API key: set one of {env_vars:?}")]
    MissingApiKey { env_vars: &'static [&'static str] },

    #[error("Invalid {name}: {value} (must be a positive number of seconds)")]
    InvalidInterval { name: &'static str, value: f64 },

    #[error("Invalid {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },
}

/// Sampling options forwarded to the model with every call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_output_tokens: 8192,
            temperature: 0.7,
        }
    }
}

impl GenerationOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_output_tokens == 0 {
            return Err(ConfigError::InvalidOption {
                name: "max_output_tokens",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidOption {
                name: "temperature",
                reason: format!("{} is outside 0.0..=2.0", self.temperature),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Seconds covered by each level-1 description
    pub level1_interval: u32,
    /// Seconds between level-2 plot summaries
    pub level2_interval: u32,
    pub options: GenerationOptions,
    pub style: PromptStyle,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            level1_interval: 10,
            level2_interval: 30,
            options: GenerationOptions::default(),
            style: PromptStyle::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.level1_interval == 0 {
            return Err(ConfigError::InvalidInterval {
                name: "level-1 interval",
                value: 0.0,
            });
        }
        if self.level2_interval == 0 {
            return Err(ConfigError::InvalidInterval {
                name: "level-2 interval",
                value: 0.0,
            });
        }
        self.options.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_intervals() {
        let config = EngineConfig {
            level1_interval: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidInterval { name: "level-1 interval", .. })
        ));

        let config = EngineConfig {
            level2_interval: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidInterval { name: "level-2 interval", .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_options() {
        let options = GenerationOptions {
            max_output_tokens: 0,
            temperature: 0.5,
        };
        assert!(options.validate().is_err());

        let options = GenerationOptions {
            max_output_tokens: 100,
            temperature: 2.5,
        };
        let err = options.validate().unwrap_err().to_string();
        assert!(err.contains("temperature"));
    }
}
