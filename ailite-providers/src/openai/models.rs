//! OpenAI request and response models
//!
//! Field names follow the snake_case keys of the wire format directly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Completion models served by the `completions` endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Model {
    /// `code-davinci-002`, up to 8k tokens
    CodeDavinci2,
    /// `text-davinci-003`, up to 4k tokens
    TextDavinci3,
    /// `text-curie-001`, up to 2k tokens
    TextCurie1,
    /// Any other model identifier
    Custom(String),
}

impl Model {
    /// The model identifier sent to the API
    pub fn as_str(&self) -> &str {
        match self {
            Model::CodeDavinci2 => "code-davinci-002",
            Model::TextDavinci3 => "text-davinci-003",
            Model::TextCurie1 => "text-curie-001",
            Model::Custom(id) => id,
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chat models served by the `chat/completions` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChatModel {
    /// `gpt-3.5-turbo`
    #[default]
    Gpt35Turbo,
    /// `gpt-3.5-turbo-0301`
    Gpt35Turbo0301,
    /// Any other model identifier
    Custom(String),
}

impl ChatModel {
    /// The model identifier sent to the API
    pub fn as_str(&self) -> &str {
        match self {
            ChatModel::Gpt35Turbo => "gpt-3.5-turbo",
            ChatModel::Gpt35Turbo0301 => "gpt-3.5-turbo-0301",
            ChatModel::Custom(id) => id,
        }
    }
}

impl fmt::Display for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Instructions for the model
    System,
    /// The human side of the conversation
    User,
    /// The model
    Assistant,
}

/// One message in a chat thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Who wrote the message
    pub role: Role,
    /// Message text
    pub content: String,
}

impl Chat {
    /// Create a message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// A system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// A user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// An assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A completion response, or one chunk of a streamed one
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Completion<C> {
    /// Response ID
    pub id: String,
    /// Object type, e.g. `text_completion`
    pub object: String,
    /// Creation time in seconds since the Unix epoch
    pub created: u64,
    /// Model that produced the completion
    pub model: String,
    /// Generated choices
    pub choices: Vec<C>,
    /// Token accounting; absent on streamed chunks
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl<C> Completion<C> {
    /// The first choice, if any
    pub fn first_choice(&self) -> Option<&C> {
        self.choices.first()
    }
}

/// A text completion
pub type TextCompletion = Completion<TextChoice>;

/// A chat completion
pub type ChatCompletion = Completion<ChatChoice>;

/// One chunk of a streamed chat completion
pub type ChatStreamCompletion = Completion<ChatStreamChoice>;

/// A choice from the `completions` endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextChoice {
    /// Generated text
    pub text: String,
    /// Position among the choices
    pub index: u32,
    /// Token log probabilities, when requested
    #[serde(default)]
    pub logprobs: Option<Logprobs>,
    /// Why generation stopped; absent until the last streamed chunk
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// A choice from the `chat/completions` endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatChoice {
    /// The generated message
    pub message: Chat,
    /// Token log probabilities, when requested
    #[serde(default)]
    pub logprobs: Option<Logprobs>,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// A choice from one chunk of a streamed chat completion
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatStreamChoice {
    /// Incremental message content
    pub delta: Delta,
    /// Position among the choices
    #[serde(default)]
    pub index: u32,
    /// Why generation stopped; set on the last chunk only
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Incremental content of a streamed chat message
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Delta {
    /// Sent on the first chunk only
    #[serde(default)]
    pub role: Option<Role>,
    /// Text added by this chunk
    #[serde(default)]
    pub content: Option<String>,
}

/// Token accounting for a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Usage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,
    /// Tokens in the completion
    pub completion_tokens: u32,
    /// Prompt plus completion
    pub total_tokens: u32,
}

/// Per-token log probabilities
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Logprobs {
    /// The generated tokens
    pub tokens: Vec<String>,
    /// Log probability of each token; the first may be null
    pub token_logprobs: Vec<Option<f32>>,
    /// Most likely alternatives at each position
    pub top_logprobs: Vec<HashMap<String, f32>>,
    /// Character offset of each token in the text
    pub text_offset: Vec<u32>,
}
