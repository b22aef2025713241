//! OpenAI provider implementation
//!
//! Text and chat completions, each available as a one-shot call or as a
//! stream of partial completions decoded from server-sent events.

use crate::error::serialization_error;
use crate::http::{HttpClient, ReqwestClient};
use crate::openai::config::OpenAIConfig;
use crate::openai::converter::{GenerationParams, OpenAIConverter};
use crate::openai::models::{
    Chat, ChatCompletion, ChatModel, ChatStreamCompletion, Model, TextCompletion,
};
use crate::source::ChunkSource;
use crate::stream::{ElementStream, StreamDecoder};
use ailite_core::Error;
use std::sync::Arc;
use tracing::debug;

/// OpenAI provider for text and chat completions
///
/// # Example
///
/// ```no_run
/// use ailite_providers::openai::{Chat, ChatModel, GenerationParams, OpenAI};
/// use futures::StreamExt;
///
/// # async fn example() -> Result<(), ailite_core::Error> {
/// let provider = OpenAI::with_api_key("your-api-key")?;
///
/// let mut stream = provider.chat_stream(
///     &[Chat::user("Count to three")],
///     &ChatModel::default(),
///     GenerationParams::default(),
/// )?;
/// while let Some(chunk) = stream.next().await {
///     if let Some(text) = chunk?.choices.first().and_then(|c| c.delta.content.clone()) {
///         print!("{}", text);
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OpenAI {
    client: Arc<dyn HttpClient>,
    source: Arc<dyn ChunkSource>,
    config: OpenAIConfig,
    converter: OpenAIConverter,
    decoder: StreamDecoder,
}

impl OpenAI {
    /// Create a provider over a transport that serves both one-shot and
    /// streaming requests
    pub fn new<C>(config: OpenAIConfig, client: Arc<C>) -> Self
    where
        C: HttpClient + ChunkSource + 'static,
    {
        Self {
            client: client.clone(),
            source: client,
            config,
            converter: OpenAIConverter,
            decoder: StreamDecoder::default(),
        }
    }

    /// Create a new OpenAI provider with just an API key
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self, Error> {
        Self::from_config(OpenAIConfig::new(api_key))
    }

    /// Create a provider with the default reqwest transport
    pub fn from_config(config: OpenAIConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::new(config, Arc::new(ReqwestClient::new()?)))
    }

    /// The provider configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Complete `prompt` in one request
    pub async fn complete(
        &self,
        prompt: &str,
        model: &Model,
        params: GenerationParams,
    ) -> Result<TextCompletion, Error> {
        let request = self
            .converter
            .completion_request(&self.config, prompt, model, params, false)?;
        let value = self.client.execute(request).await?;
        serde_json::from_value(value).map_err(serialization_error)
    }

    /// Continue a chat thread in one request
    pub async fn continue_chat(
        &self,
        thread: &[Chat],
        model: &ChatModel,
        params: GenerationParams,
    ) -> Result<ChatCompletion, Error> {
        let request = self
            .converter
            .chat_request(&self.config, thread, model, params, false)?;
        let value = self.client.execute(request).await?;
        serde_json::from_value(value).map_err(serialization_error)
    }

    /// Stream partial completions of `prompt`
    pub fn completion_stream(
        &self,
        prompt: &str,
        model: &Model,
        params: GenerationParams,
    ) -> Result<ElementStream<TextCompletion>, Error> {
        let request = self
            .converter
            .completion_request(&self.config, prompt, model, params, true)?;
        debug!(model = %model, "starting completion stream");
        Ok(self.decoder.decode(self.source.as_ref(), request))
    }

    /// Stream the next message of a chat thread
    pub fn chat_stream(
        &self,
        thread: &[Chat],
        model: &ChatModel,
        params: GenerationParams,
    ) -> Result<ElementStream<ChatStreamCompletion>, Error> {
        let request = self
            .converter
            .chat_request(&self.config, thread, model, params, true)?;
        debug!(model = %model, messages = thread.len(), "starting chat stream");
        Ok(self.decoder.decode(self.source.as_ref(), request))
    }
}
