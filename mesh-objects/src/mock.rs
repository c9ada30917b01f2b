//! Scripted transport for testing.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use serde_json::Value;

use crate::error::TransportError;
use crate::transport::Transport;

/// A request observed by [`MockTransport`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Vec<u8>>,
}

impl RecordedRequest {
    /// Body decoded as JSON, if there was one
    pub fn json(&self) -> Option<Value> {
        self.body
            .as_deref()
            .and_then(|b| serde_json::from_slice(b).ok())
    }
}

/// In-process transport that replays queued responses in order and records
/// every request it receives.
///
/// Once the queue is drained every further request fails.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Bytes, String>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON response body
    pub fn with_json(self, body: Value) -> Self {
        self.with_body(body.to_string())
    }

    /// Queue a raw response body
    pub fn with_body(self, body: impl Into<String>) -> Self {
        self.push(Ok(Bytes::from(body.into())));
        self
    }

    /// Queue a transport failure
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()));
        self
    }

    /// Queue the same failure `count` times
    pub fn with_failures(mut self, count: usize, message: &str) -> Self {
        for _ in 0..count {
            self = self.with_failure(message);
        }
        self
    }

    fn push(&self, response: Result<Bytes, String>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Number of requests received with the given method
    pub fn count(&self, method: &Method) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| &r.method == method)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Bytes, TransportError> {
        let body = if method == Method::GET { None } else { body };
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedRequest {
                method: method.clone(),
                url: url.to_string(),
                body,
            });

        let next = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match next {
            Some(Ok(body)) => Ok(body),
            Some(Err(message)) => Err(TransportError::Other {
                method,
                url: url.to_string(),
                message,
            }),
            None => Err(TransportError::Other {
                method,
                url: url.to_string(),
                message: "no scripted response".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let mock = MockTransport::new()
            .with_json(json!({"result": {}}))
            .with_failure("connection reset");

        let first = mock
            .send(Method::POST, "http://cp/v1.0/zone", Some(b"{}".to_vec()))
            .await
            .unwrap();
        assert_eq!(first, Bytes::from(r#"{"result":{}}"#));

        let second = mock.send(Method::GET, "http://cp/v1.0/zone", None).await;
        assert!(second.is_err());

        let third = mock.send(Method::GET, "http://cp/v1.0/zone", None).await;
        assert!(third.unwrap_err().to_string().contains("no scripted response"));

        assert_eq!(mock.request_count(), 3);
        assert_eq!(mock.count(&Method::GET), 2);
        assert_eq!(mock.requests()[0].json(), Some(json!({})));
    }

    #[tokio::test]
    async fn test_get_body_is_dropped() {
        let mock = MockTransport::new().with_json(json!({}));
        mock.send(Method::GET, "http://cp/v1.0/zone", Some(b"{}".to_vec()))
            .await
            .unwrap();

        assert_eq!(mock.requests()[0].body, None);
    }
}
