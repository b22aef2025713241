//! HTTP transport built on reqwest

use crate::constants::DEFAULT_TIMEOUT;
use crate::error::{check_response_status, network_error};
use crate::source::{ChunkHandler, ChunkSource, Subscription};
use ailite_core::{Error, HttpRequest, Method};
use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One-shot HTTP client abstraction
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send a request and decode the whole response body as JSON
    async fn execute(&self, request: HttpRequest) -> Result<Value, Error>;
}

/// Default transport implementation using reqwest
///
/// Serves both one-shot requests ([`HttpClient`]) and incremental body
/// delivery ([`ChunkSource`]).
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a new HTTP client with the default timeout
    pub fn new() -> Result<Self, Error> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a new HTTP client with a custom overall request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(network_error)?;

        Ok(Self { client })
    }

    /// Wrap an existing reqwest client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn prepare(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let mut builder = match request.method() {
            Method::Get => self.client.get(request.url()),
            Method::Post => self.client.post(request.url()),
        };
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body_bytes() {
            builder = builder.body(body.to_vec());
        }
        builder
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: HttpRequest) -> Result<Value, Error> {
        debug!(method = %request.method(), url = request.url(), "sending request");
        let response = self
            .prepare(&request)
            .send()
            .await
            .map_err(network_error)?;

        let response = check_response_status(response).await?;
        response.json().await.map_err(network_error)
    }
}

impl ChunkSource for ReqwestClient {
    fn open(&self, request: HttpRequest, handler: Arc<dyn ChunkHandler>) -> Subscription {
        debug!(method = %request.method(), url = request.url(), "opening stream");
        let pending = self.prepare(&request).send();

        Subscription::spawn(handler, async move {
            let response = pending.await.map_err(network_error)?;
            let response = check_response_status(response).await?;
            Ok(response.bytes_stream().map_err(network_error))
        })
    }
}
