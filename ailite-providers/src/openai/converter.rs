//! Request construction for OpenAI

use crate::constants::{DEFAULT_CREATIVITY, DEFAULT_WORD_LIMIT};
use crate::openai::config::OpenAIConfig;
use crate::openai::models::{Chat, ChatModel, Model};
use ailite_core::{Error, HttpRequest, Result};
use serde_json::{json, Value};

/// Generation settings shared by every OpenAI call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Rough upper bound on the number of words generated
    pub word_limit: u16,
    /// Sampling temperature between 0 and 1
    pub creativity: f64,
}

impl GenerationParams {
    /// Set the word limit
    pub fn with_word_limit(mut self, word_limit: u16) -> Self {
        self.word_limit = word_limit;
        self
    }

    /// Set the sampling temperature
    pub fn with_creativity(mut self, creativity: f64) -> Self {
        self.creativity = creativity;
        self
    }

    /// Check that the settings can be sent as-is
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.creativity) {
            return Err(Error::Validation(format!(
                "creativity must be between 0 and 1, got {}",
                self.creativity
            )));
        }
        Ok(())
    }

    /// Token budget for the word limit, at roughly 0.75 words per token
    pub fn max_tokens(&self) -> u32 {
        u32::from(self.word_limit) * 4 / 3
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            word_limit: DEFAULT_WORD_LIMIT,
            creativity: DEFAULT_CREATIVITY,
        }
    }
}

/// Builds OpenAI HTTP requests from typed arguments
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAIConverter;

impl OpenAIConverter {
    /// Request for the `completions` endpoint
    pub fn completion_request(
        &self,
        config: &OpenAIConfig,
        prompt: &str,
        model: &Model,
        params: GenerationParams,
        stream: bool,
    ) -> Result<HttpRequest> {
        params.validate()?;
        let mut body = self.base_body(model.as_str(), params, stream);
        body["prompt"] = json!(prompt);
        self.request(config, config.completions_url(), &body)
    }

    /// Request for the `chat/completions` endpoint
    pub fn chat_request(
        &self,
        config: &OpenAIConfig,
        thread: &[Chat],
        model: &ChatModel,
        params: GenerationParams,
        stream: bool,
    ) -> Result<HttpRequest> {
        params.validate()?;
        let mut body = self.base_body(model.as_str(), params, stream);
        body["messages"] = json!(thread);
        self.request(config, config.chat_url(), &body)
    }

    fn base_body(&self, model: &str, params: GenerationParams, stream: bool) -> Value {
        json!({
            "model": model,
            "max_tokens": params.max_tokens(),
            "temperature": params.creativity,
            "top_p": 1,
            "frequency_penalty": 0,
            "presence_penalty": 0,
            "stream": stream,
        })
    }

    fn request(&self, config: &OpenAIConfig, url: String, body: &Value) -> Result<HttpRequest> {
        let mut request = HttpRequest::post(url)
            .header("Authorization", format!("Bearer {}", config.api_key));
        if let Some(org) = &config.organization_id {
            request = request.header("OpenAI-Organization", org.clone());
        }
        request.json(body)
    }
}
