//! Request/response transport to the control-plane API

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client, Method};
use tracing::debug;

use crate::error::TransportError;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// One request, one raw response body.
///
/// Implementations return the body for every received response regardless
/// of status, and only fail when no response was received. They never
/// retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `body` to `url`. `GET` requests are sent without a body.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Bytes, TransportError>;
}

/// reqwest-backed transport with a fixed timeout.
///
/// The inner client is pooled; clones share connections.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Bytes, TransportError> {
        let mut request = self.client.request(method.clone(), url);
        if method != Method::GET {
            if let Some(body) = body {
                request = request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(body);
            }
        }

        let request_error = |source: reqwest::Error| TransportError::Request {
            method: method.clone(),
            url: url.to_string(),
            source,
        };

        let response = request.send().await.map_err(request_error)?;
        let status = response.status();
        debug!(method = %method, url, status = status.as_u16(), "Control plane responded");

        response.bytes().await.map_err(request_error)
    }
}
