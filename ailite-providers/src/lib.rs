//! Transport, stream decoding and provider implementations
//!
//! The interesting part of this crate is the streaming pipeline:
//! a [`ChunkSource`] pushes raw response bytes into a handler as they arrive,
//! and the [`StreamDecoder`] turns those pushes into a pull-based
//! [`ElementStream`] of typed values.

#![warn(missing_docs)]

pub mod anthropic;
pub mod constants;
pub mod error;
pub mod http;
pub mod openai;
pub mod source;
pub mod stream;

// Re-export provider types
pub use anthropic::Anthropic;
pub use openai::OpenAI;

// Re-export the streaming pipeline
pub use http::{HttpClient, ReqwestClient};
pub use source::{ChunkHandler, ChunkSource, Completion, Subscription};
pub use stream::{DecodeError, ElementStream, Frame, LineBuffer, StreamDecoder, StreamFormat};
