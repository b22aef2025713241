//! OpenAI provider implementation

mod config;
mod converter;
mod models;
mod provider;

pub use config::OpenAIConfig;
pub use converter::{GenerationParams, OpenAIConverter};
pub use models::{
    Chat, ChatChoice, ChatCompletion, ChatModel, ChatStreamChoice, ChatStreamCompletion,
    Completion, Delta, Logprobs, Model, Role, TextChoice, TextCompletion, Usage,
};
pub use provider::OpenAI;
