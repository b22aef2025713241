//! Anthropic Claude provider implementation

mod config;
mod provider;

pub use config::AnthropicConfig;
pub use provider::{Anthropic, AnthropicModel, Message, Sender};
