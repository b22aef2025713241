//! Error types for the AILite client

use std::error::Error as StdError;
use std::fmt;

/// The main error type for all AILite operations
///
/// Only connection-level and request-level failures are represented here.
/// Problems with an individual stream frame are absorbed by the stream
/// decoder and never surface as an `Error`.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Transport failures: DNS, TLS, connection reset, body read errors
    Network {
        /// Error message
        message: String,
        /// Underlying error if available
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// The server answered with a non-success status
    Http {
        /// HTTP status code
        status: u16,
        /// Response body, if it could be read
        body: String,
    },

    /// Provider answered successfully but without usable content
    Provider {
        /// Provider name (e.g., "openai", "anthropic")
        provider: String,
        /// Error message
        message: String,
    },

    /// Serialization/deserialization errors
    Serialization {
        /// Error message
        message: String,
        /// Underlying error if available
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// Configuration errors
    Configuration(String),

    /// Validation errors
    Validation(String),

    /// Timeout errors
    Timeout,
}

impl Error {
    /// Whether this error came from the wire rather than from local input
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Network { .. } | Error::Http { .. } | Error::Timeout)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Network { message, .. } => write!(f, "Network error: {}", message),
            Error::Http { status, body } if body.is_empty() => write!(f, "HTTP {}", status),
            Error::Http { status, body } => write!(f, "HTTP {}: {}", status, body),
            Error::Provider { provider, message } => {
                write!(f, "Provider error ({}): {}", provider, message)
            }
            Error::Serialization { message, .. } => write!(f, "Serialization error: {}", message),
            Error::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Error::Validation(msg) => write!(f, "Validation error: {}", msg),
            Error::Timeout => write!(f, "Operation timed out"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Network { source, .. } | Error::Serialization { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn StdError + 'static)),
            _ => None,
        }
    }
}

/// Result type alias for AILite operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Network {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
