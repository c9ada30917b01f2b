//! Types for the mesh objects client

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MeshError;
use crate::revision::Revision;
use crate::transport::DEFAULT_TIMEOUT;

/// Client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Control-plane address, without the `/v1.0` API prefix
    pub base_url: String,
    /// Per-request timeout (default: 3s)
    pub timeout: Duration,
    /// Readiness ping attempts before giving up (default: 5)
    pub ping_attempts: u32,
    /// Pause between failed readiness pings (default: 1s)
    pub ping_interval: Duration,
    /// Kind fetched by the readiness ping; must always exist remotely
    pub ping_kind: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5555".to_string(),
            timeout: DEFAULT_TIMEOUT,
            ping_attempts: 5,
            ping_interval: Duration::from_secs(1),
            ping_kind: "zone".to_string(),
        }
    }
}

impl ClientConfig {
    /// Create config pointing at a control plane, with defaults otherwise
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Create config from environment variables
    ///
    /// Unset or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = std::env::var("MESH_API_URL").unwrap_or(defaults.base_url);

        let timeout = std::env::var("MESH_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let ping_attempts = std::env::var("MESH_PING_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.ping_attempts);

        let ping_interval = std::env::var("MESH_PING_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.ping_interval);

        Self {
            base_url,
            timeout,
            ping_attempts,
            ping_interval,
            ping_kind: defaults.ping_kind,
        }
    }

    /// API root, `<base_url>/v1.0`
    pub fn api_base(&self) -> String {
        format!("{}/v1.0", self.base_url.trim_end_matches('/'))
    }
}

/// A configuration object supplied by a producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    /// Mesh the object belongs to
    pub mesh: String,
    /// Object kind, in any case (e.g. "cluster", "Route")
    pub kind: String,
    /// Object key within its kind
    pub key: String,
    /// Object document as accepted by the control plane
    pub object: Value,
}

/// A partial update to an existing object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSpec {
    pub kind: String,
    pub key: String,
    /// Top-level fields to overwrite
    pub changes: Map<String, Value>,
}

/// How `get_or_make` satisfied a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Revision was already in the local cache; no request was sent
    Cached,
    /// Object already existed on the control plane
    Existing,
    /// Object was created; carries the returned checksum
    Created(String),
}

/// Summary of a batch apply
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Revisions that ended up applied, and how
    pub applied: Vec<(Revision, ApplyOutcome)>,
    /// Revisions whose apply failed
    pub failed: Vec<(Revision, MeshError)>,
    /// Objects whose kind could not be normalized; no request was sent
    pub rejected: Vec<(ObjectSpec, MeshError)>,
}

impl SyncReport {
    fn count(&self, wanted: fn(&ApplyOutcome) -> bool) -> usize {
        self.applied.iter().filter(|(_, outcome)| wanted(outcome)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, ApplyOutcome::Created(_)))
    }

    pub fn existing(&self) -> usize {
        self.count(|o| matches!(o, ApplyOutcome::Existing))
    }

    pub fn cached(&self) -> usize {
        self.count(|o| matches!(o, ApplyOutcome::Cached))
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.rejected.is_empty()
    }
}
