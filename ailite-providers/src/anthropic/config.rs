//! Anthropic provider configuration

use crate::constants::{ANTHROPIC_API_KEY_ENV, ANTHROPIC_DEFAULT_BASE_URL};
use ailite_core::Error;
use url::Url;

/// Configuration for the Anthropic provider
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key for authentication
    pub api_key: String,
    /// Base URL for the Anthropic API
    pub base_url: String,
}

impl AnthropicConfig {
    /// Create a new configuration with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: ANTHROPIC_DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Read the API key from `ANTHROPIC_API_KEY`
    pub fn from_env() -> Result<Self, Error> {
        std::env::var(ANTHROPIC_API_KEY_ENV)
            .map(Self::new)
            .map_err(|_| Error::Configuration(format!("{} is not set", ANTHROPIC_API_KEY_ENV)))
    }

    /// Set the base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Check that the key is present and the base URL parses
    pub fn validate(&self) -> Result<(), Error> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Configuration("Anthropic API key is empty".to_string()));
        }
        Url::parse(&self.base_url)
            .map(|_| ())
            .map_err(|e| Error::Configuration(format!("Invalid base URL: {}", e)))
    }

    /// Get the URL for the legacy text completion endpoint
    pub fn complete_url(&self) -> String {
        format!("{}/complete", self.base_url.trim_end_matches('/'))
    }
}
