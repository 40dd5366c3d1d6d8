//! HTTP transport used by the gateway client
//!
//! The client only talks to the network through [`Transport`], so the
//! envelope handling and request shaping can be exercised against an
//! in-memory implementation.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{
    Client,
    Method,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl TransportError {
    /// Connection-level failures are the only ones worth repeating.
    pub fn is_connect(&self) -> bool {
        matches!(self, TransportError::Connect(_))
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// A fully-shaped outgoing request.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
}

impl GatewayRequest {
    pub fn get(url: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers,
            body: None,
            timeout: None,
        }
    }

    pub fn post(url: impl Into<String>, headers: HeaderMap, body: Option<Vec<u8>>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers,
            body,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A response whose body has been read in full.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

/// A response whose body is consumed chunk by chunk.
#[async_trait]
pub trait ByteStream: Send {
    fn status(&self) -> u16;

    async fn next_chunk(&mut self) -> Result<Option<Bytes>, TransportError>;
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: GatewayRequest) -> Result<TransportResponse, TransportError>;

    async fn open(&self, request: GatewayRequest) -> Result<Box<dyn ByteStream>, TransportError>;
}

/// [`Transport`] backed by a pooled `reqwest` client.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        // Another component may already have installed a provider.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let client = Client::builder()
            .use_rustls_tls()
            .no_proxy()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn dispatch(&self, request: GatewayRequest) -> Result<reqwest::Response, TransportError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        builder.send().await.map_err(TransportError::from_reqwest)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: GatewayRequest) -> Result<TransportResponse, TransportError> {
        let response = self.dispatch(request).await?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(TransportError::from_reqwest)?;

        Ok(TransportResponse { status, body })
    }

    async fn open(&self, request: GatewayRequest) -> Result<Box<dyn ByteStream>, TransportError> {
        let response = self.dispatch(request).await?;
        Ok(Box::new(ResponseStream { response }))
    }
}

struct ResponseStream {
    response: reqwest::Response,
}

#[async_trait]
impl ByteStream for ResponseStream {
    fn status(&self) -> u16 {
        self.response.status().as_u16()
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>, TransportError> {
        self.response
            .chunk()
            .await
            .map_err(TransportError::from_reqwest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_connect_errors_are_retryable() {
        assert!(TransportError::Connect("refused".into()).is_connect());
        assert!(!TransportError::Timeout("slow".into()).is_connect());
        assert!(!TransportError::Request("bad".into()).is_connect());
        assert!(!TransportError::Body("cut".into()).is_connect());
    }

    #[test]
    fn test_request_builders() {
        let get = GatewayRequest::get("http://gw/a", HeaderMap::new())
            .with_timeout(Duration::from_secs(60));
        assert_eq!(get.method, Method::GET);
        assert_eq!(get.timeout, Some(Duration::from_secs(60)));
        assert!(get.body.is_none());

        let post = GatewayRequest::post("http://gw/b", HeaderMap::new(), Some(b"{}".to_vec()));
        assert_eq!(post.method, Method::POST);
        assert_eq!(post.body.as_deref(), Some(&b"{}"[..]));
        assert!(post.timeout.is_none());
    }
}
