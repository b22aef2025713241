//! OpenAI provider configuration

use crate::constants::{OPENAI_API_KEY_ENV, OPENAI_DEFAULT_BASE_URL};
use ailite_core::Error;
use url::Url;

/// Configuration for the OpenAI provider
///
/// The API key travels with the provider instance; there is no global key.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication
    pub api_key: String,
    /// Base URL for the API
    pub base_url: String,
    /// Optional organization ID
    pub organization_id: Option<String>,
}

impl OpenAIConfig {
    /// Create a new configuration with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENAI_DEFAULT_BASE_URL.to_string(),
            organization_id: None,
        }
    }

    /// Read the API key from `OPENAI_API_KEY`
    pub fn from_env() -> Result<Self, Error> {
        std::env::var(OPENAI_API_KEY_ENV)
            .map(Self::new)
            .map_err(|_| Error::Configuration(format!("{} is not set", OPENAI_API_KEY_ENV)))
    }

    /// Set a custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the organization ID
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization_id = Some(org.into());
        self
    }

    /// Check that the key is present and the base URL is usable
    pub fn validate(&self) -> Result<(), Error> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Configuration("OpenAI API key is empty".to_string()));
        }
        let url = Url::parse(&self.base_url)
            .map_err(|e| Error::Configuration(format!("Invalid base URL: {}", e)))?;
        if url.cannot_be_a_base() {
            return Err(Error::Configuration(format!(
                "Base URL cannot have paths appended: {}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Get the URL for text completions
    pub fn completions_url(&self) -> String {
        self.endpoint("completions")
    }

    /// Get the URL for chat completions
    pub fn chat_url(&self) -> String {
        self.endpoint("chat/completions")
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}
