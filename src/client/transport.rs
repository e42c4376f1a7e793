//! Transport seam over the HTTP library.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use url::Url;

use crate::client::error::{ClientError, ClientResult};

/// A fully-resolved outbound request, ready for the wire.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl UpstreamRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }
}

/// An upstream response as seen by the pipeline.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    /// Response body decoded as UTF-8 (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Narrow interface to the HTTP transport.
///
/// Implementations report wire-level outcomes only: a response (of any
/// status) on success, `Network`/`Timeout` on failure. Status
/// classification happens above this seam.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: UpstreamRequest) -> ClientResult<UpstreamResponse>;
}

/// Production transport backed by `reqwest`.
///
/// Connection pooling, TLS and DNS are the library's responsibility; one
/// `HttpTransport` is safely shared by many concurrent callers.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with the given total request timeout.
    pub fn new(request_timeout: Duration) -> ClientResult<Self> {
        let inner = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self { inner })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: UpstreamRequest) -> ClientResult<UpstreamResponse> {
        let mut builder = self.inner.request(request.method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(map_reqwest_error)?
            .to_vec();

        Ok(UpstreamResponse { status, body })
    }
}

fn map_reqwest_error(error: reqwest::Error) -> ClientError {
    if error.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Network(error.to_string())
    }
}
