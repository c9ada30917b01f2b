//! Error types for the mesh objects client

use reqwest::Method;
use thiserror::Error;

use crate::revision::Kind;

/// Failure to complete a single request/response exchange.
///
/// A response with a non-2xx status is not a transport error; the control
/// plane reports failures in the response body.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request could not be sent or the response body could not be read
    #[error("{method} {url}: {source}")]
    Request {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Failure reported by a non-HTTP transport
    #[error("{method} {url}: {message}")]
    Other {
        method: Method,
        url: String,
        message: String,
    },

    /// HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Mesh objects client error
#[derive(Debug, Error)]
pub enum MeshError {
    /// Connection, timeout or request construction failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Response did not have the expected shape
    #[error("{operation} {kind}/{key}: unexpected response: {reason}")]
    Protocol {
        operation: &'static str,
        kind: Kind,
        key: String,
        reason: String,
    },

    /// Object expected to exist on the control plane is absent
    #[error("{kind}/{key} not found on control plane")]
    NotFound { kind: Kind, key: String },

    /// Readiness ping exhausted its attempts
    #[error("control plane at {url} unreachable after {attempts} attempts: {last_error}")]
    Unreachable {
        url: String,
        attempts: u32,
        last_error: String,
    },

    /// Object could not be serialized for submission
    #[error("failed to encode {kind}/{key}: {source}")]
    Encode {
        kind: Kind,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Producer supplied an empty kind
    #[error("invalid object kind: {0:?}")]
    InvalidKind(String),
}

impl MeshError {
    /// Whether re-invoking the same operation later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, MeshError::Transport(_) | MeshError::Unreachable { .. })
    }
}

/// Result type for mesh object operations
pub type Result<T> = std::result::Result<T, MeshError>;
