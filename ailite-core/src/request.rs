//! The dispatchable HTTP request value

use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// GET
    Get,
    /// POST
    #[default]
    Post,
}

impl Method {
    /// The method name as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully constructed HTTP request
///
/// Built by a provider's request builder and handed to a transport. The
/// stream pipeline never looks inside the body.
///
/// # Example
///
/// ```
/// use ailite_core::{HttpRequest, Method};
/// use serde_json::json;
///
/// let request = HttpRequest::post("https://api.openai.com/v1/completions")
///     .header("Authorization", "Bearer sk-test")
///     .json(&json!({ "prompt": "Hello", "stream": true }))
///     .unwrap();
///
/// assert_eq!(request.method(), Method::Post);
/// assert_eq!(request.header_value("content-type"), Some("application/json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    url: String,
    method: Method,
    headers: BTreeMap<String, String>,
    body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Create a request with the given method and URL
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    /// Add a header. Names are case-insensitive and stored lower-cased.
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Set a raw body
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set the content type
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(self.header("content-type", "application/json").body(body))
    }

    /// Target URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP method
    pub fn method(&self) -> Method {
        self.method
    }

    /// All headers, keyed by lower-cased name
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Look up a header value by name, ignoring case
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Body bytes, if any
    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}
