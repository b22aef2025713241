//! Constants for provider implementations

use std::time::Duration;

/// Default OpenAI base URL
pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable holding the OpenAI API key
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default Anthropic base URL
pub const ANTHROPIC_DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Environment variable holding the Anthropic API key
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Default word limit for OpenAI generations
pub const DEFAULT_WORD_LIMIT: u16 = 256;

/// Default sampling temperature
pub const DEFAULT_CREATIVITY: f64 = 0.5;

/// Default Anthropic response token limit
pub const DEFAULT_RESPONSE_TOKEN_LIMIT: u32 = 5000;

/// Default request timeout for the reqwest transport
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Frame prefix used by server-sent events
pub const SSE_DATA_PREFIX: &str = "data: ";

/// Frame marking the end of an OpenAI stream
pub const DONE_SENTINEL: &str = "[DONE]";
