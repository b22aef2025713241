//! Anthropic provider implementation
//!
//! Talks to the legacy `/v1/complete` endpoint, where the conversation is
//! flattened into a single prompt of `Human:`/`Assistant:` turns.

use crate::anthropic::config::AnthropicConfig;
use crate::constants::DEFAULT_RESPONSE_TOKEN_LIMIT;
use crate::error::{serialization_error, to_core_error};
use crate::http::{HttpClient, ReqwestClient};
use ailite_core::{Error, HttpRequest};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

const API_VERSION: &str = "2023-06-01";

/// Claude models served by the completion endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AnthropicModel {
    /// `claude-instant-v1.1-100k`
    #[default]
    ClaudeInstantLatest,
    /// Any other model identifier
    Custom(String),
}

impl AnthropicModel {
    /// The model identifier sent to the API
    pub fn as_str(&self) -> &str {
        match self {
            AnthropicModel::ClaudeInstantLatest => "claude-instant-v1.1-100k",
            AnthropicModel::Custom(id) => id,
        }
    }
}

/// Speaker of a prompt turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    /// The user
    Human,
    /// The model
    Assistant,
}

impl Sender {
    /// The turn marker placed before the message text
    pub fn marker(&self) -> &'static str {
        match self {
            Sender::Human => "\n\nHuman: ",
            Sender::Assistant => "\n\nAssistant: ",
        }
    }
}

/// One turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who speaks
    pub sender: Sender,
    /// What they say
    pub text: String,
}

impl Message {
    /// Create a turn
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    completion: String,
}

/// Anthropic Claude provider
///
/// # Example
///
/// ```no_run
/// use ailite_providers::anthropic::{Anthropic, AnthropicModel, Message, Sender};
///
/// # async fn example() -> Result<(), ailite_core::Error> {
/// let provider = Anthropic::with_api_key("your-api-key")?;
/// let messages = [
///     Message::new(Sender::Human, "Name a colour"),
///     Message::new(Sender::Assistant, ""),
/// ];
/// let text = provider
///     .complete(&messages, &AnthropicModel::default(), 256)
///     .await?;
/// println!("{}", text);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Anthropic {
    config: AnthropicConfig,
    client: Arc<dyn HttpClient>,
}

impl Anthropic {
    /// Create a new Anthropic provider with the given configuration and client
    pub fn new(config: AnthropicConfig, client: Arc<dyn HttpClient>) -> Self {
        Self { config, client }
    }

    /// Create a new Anthropic provider with just an API key
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self, Error> {
        let config = AnthropicConfig::new(api_key);
        config.validate()?;
        Ok(Self::new(config, Arc::new(ReqwestClient::new()?)))
    }

    /// Flatten turns into the completion prompt
    pub fn prompt(messages: &[Message]) -> String {
        messages
            .iter()
            .map(|m| format!("{}{}", m.sender.marker(), m.text))
            .collect()
    }

    /// Build the completion request
    pub fn completion_request(
        &self,
        messages: &[Message],
        model: &AnthropicModel,
        response_token_limit: u32,
    ) -> Result<HttpRequest, Error> {
        HttpRequest::post(self.config.complete_url())
            .header("x-api-key", self.config.api_key.clone())
            .header("anthropic-version", API_VERSION)
            .json(&json!({
                "prompt": Self::prompt(messages),
                "max_tokens_to_sample": response_token_limit,
                "model": model.as_str(),
            }))
    }

    /// Complete the conversation and return the generated text
    pub async fn complete(
        &self,
        messages: &[Message],
        model: &AnthropicModel,
        response_token_limit: u32,
    ) -> Result<String, Error> {
        let request = self.completion_request(messages, model, response_token_limit)?;
        debug!(model = model.as_str(), turns = messages.len(), "requesting completion");

        let value = self.client.execute(request).await?;
        let response: CompletionResponse =
            serde_json::from_value(value).map_err(serialization_error)?;
        if response.completion.is_empty() {
            return Err(to_core_error("anthropic", "Empty completion"));
        }
        Ok(response.completion)
    }

    /// Complete with the default model and token limit
    pub async fn complete_default(&self, messages: &[Message]) -> Result<String, Error> {
        self.complete(
            messages,
            &AnthropicModel::default(),
            DEFAULT_RESPONSE_TOKEN_LIMIT,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::sync::Mutex;

    struct CannedClient {
        response: Value,
        seen: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl HttpClient for CannedClient {
        async fn execute(&self, request: HttpRequest) -> Result<Value, Error> {
            self.seen.lock().unwrap().push(request);
            Ok(self.response.clone())
        }
    }

    fn provider(response: Value) -> (Anthropic, Arc<CannedClient>) {
        let client = Arc::new(CannedClient {
            response,
            seen: Mutex::new(Vec::new()),
        });
        let provider = Anthropic::new(AnthropicConfig::new("key"), client.clone());
        (provider, client)
    }

    #[test]
    fn test_prompt_concatenates_turns() {
        let prompt = Anthropic::prompt(&[
            Message::new(Sender::Human, "Hi"),
            Message::new(Sender::Assistant, ""),
        ]);
        assert_eq!(prompt, "\n\nHuman: Hi\n\nAssistant: ");
    }

    #[tokio::test]
    async fn test_complete_sends_expected_body() {
        let (provider, client) = provider(json!({ "completion": " Blue." }));
        let messages = [Message::new(Sender::Human, "Colour?")];

        let text = provider.complete_default(&messages).await.unwrap();
        assert_eq!(text, " Blue.");

        let seen = client.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.url(), "https://api.anthropic.com/v1/complete");
        assert_eq!(request.header_value("X-API-Key"), Some("key"));
        let body: Value = serde_json::from_slice(request.body_bytes().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "prompt": "\n\nHuman: Colour?",
                "max_tokens_to_sample": 5000,
                "model": "claude-instant-v1.1-100k",
            })
        );
    }

    #[tokio::test]
    async fn test_empty_completion_is_an_error() {
        let (provider, _) = provider(json!({ "completion": "" }));
        let error = provider.complete_default(&[]).await.unwrap_err();
        assert!(matches!(error, Error::Provider { .. }));
    }

    #[tokio::test]
    async fn test_malformed_response_is_a_serialization_error() {
        let (provider, _) = provider(json!({ "unexpected": true }));
        let error = provider.complete_default(&[]).await.unwrap_err();
        assert!(matches!(error, Error::Serialization { .. }));
    }
}
