//! Core types for the AILite LLM client
//!
//! This crate holds the pieces every other AILite crate agrees on: the error
//! taxonomy and the [`HttpRequest`] value that request builders produce and the
//! transport dispatches. It has no networking or async dependencies.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod request;

// Re-export commonly used items
pub use error::{Error, Result};
pub use request::{HttpRequest, Method};
