//! AILite - a lightweight Rust client for hosted LLM APIs
//!
//! Text and chat completions from OpenAI and Anthropic, with first-class
//! support for streamed responses: server-sent events are decoded
//! incrementally into typed values that you consume as a `Stream`.
//!
//! # Quick Start
//!
//! ```no_run
//! # use ailite::prelude::*;
//! # use futures::StreamExt;
//! #
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let provider = OpenAI::with_api_key("your-api-key")?;
//!
//! let mut stream = provider.completion_stream(
//!     "Write a haiku about rust",
//!     &Model::TextDavinci3,
//!     GenerationParams::default(),
//! )?;
//!
//! while let Some(chunk) = stream.next().await {
//!     for choice in chunk?.choices {
//!         print!("{}", choice.text);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Re-export core types
pub use ailite_core::*;

#[cfg(feature = "providers")]
#[cfg_attr(docsrs, doc(cfg(feature = "providers")))]
pub mod providers {
    //! Transport, stream decoding and provider implementations
    pub use ailite_providers::*;
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use ailite_core::{Error, HttpRequest, Method, Result};

    #[cfg(feature = "providers")]
    pub use ailite_providers::{
        anthropic::{Anthropic, AnthropicConfig, AnthropicModel, Message, Sender},
        openai::{Chat, ChatModel, GenerationParams, Model, OpenAI, OpenAIConfig, Role},
        ElementStream, ReqwestClient, StreamDecoder, StreamFormat,
    };
}
