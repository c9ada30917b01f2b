//! Sync client for the control-plane API
//!
//! Implements the reconciliation protocol on top of a [`Transport`]:
//!
//! - `ping`: wait for the control plane to come up
//! - `make`: unconditional create, records the returned checksum
//! - `get_or_make`: create only if neither the cache nor the control plane
//!   already has the object
//! - `change`: read-modify-write of top-level fields on an existing object

use std::sync::Arc;

use reqwest::Method;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::cache::RevisionCache;
use crate::document::{Document, ShapeError};
use crate::error::{MeshError, Result};
use crate::revision::{Kind, Revision};
use crate::transport::{HttpTransport, Transport};
use crate::types::{ApplyOutcome, ClientConfig, ObjectSpec, SyncReport};

/// Client that pushes configuration objects to the control plane
///
/// Cheap to clone; clones share the transport and the cache.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use mesh_objects::{ClientConfig, RevisionCache, SyncClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let cache = Arc::new(RevisionCache::new());
/// let client = SyncClient::new(ClientConfig::new("http://control:5555"), cache)?;
///
/// client.ping().await?;
/// client
///     .get_or_make(
///         "mesh-sample",
///         "cluster",
///         "edge",
///         &serde_json::json!({"cluster_key": "edge", "zone_key": "default"}),
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SyncClient {
    config: ClientConfig,
    api_base: String,
    cache: Arc<RevisionCache>,
    transport: Arc<dyn Transport>,
}

impl SyncClient {
    /// Create a client that talks HTTP to `config.base_url`
    pub fn new(config: ClientConfig, cache: Arc<RevisionCache>) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, cache, Arc::new(transport)))
    }

    /// Create a client over an arbitrary transport
    pub fn with_transport(
        config: ClientConfig,
        cache: Arc<RevisionCache>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let api_base = config.api_base();
        Self {
            config,
            api_base,
            cache,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shared idempotency cache
    pub fn cache(&self) -> &Arc<RevisionCache> {
        &self.cache
    }

    fn kind_url(&self, kind: &Kind) -> String {
        format!("{}/{}", self.api_base, kind.path_segment())
    }

    fn object_url(&self, kind: &Kind, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.api_base,
            kind.path_segment(),
            urlencoding::encode(key)
        )
    }

    /// Wait until the control plane answers.
    ///
    /// Fetches the always-present `ping_kind` collection up to
    /// `ping_attempts` times, sleeping `ping_interval` after each failure.
    /// Any response counts as reachable.
    pub async fn ping(&self) -> Result<()> {
        let url = format!("{}/{}", self.api_base, self.config.ping_kind);
        let attempts = self.config.ping_attempts.max(1);

        let mut last_error = String::new();
        for attempt in 1..=attempts {
            match self.transport.send(Method::GET, &url, None).await {
                Ok(_) => {
                    debug!(url = %url, attempt, "Control plane reachable");
                    return Ok(());
                }
                Err(e) => {
                    warn!(url = %url, attempt, attempts, error = %e, "Control plane not reachable");
                    last_error = e.to_string();
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.config.ping_interval).await;
            }
        }

        Err(MeshError::Unreachable {
            url,
            attempts,
            last_error,
        })
    }

    /// Create `object` on the control plane and cache the returned checksum.
    ///
    /// Always sends the create, whether or not the revision is cached.
    pub async fn make(&self, mesh: &str, kind: &str, key: &str, object: &Value) -> Result<String> {
        let revision = Revision::parse(mesh, kind, key)?;
        self.make_revision(&revision, object).await
    }

    async fn make_revision(&self, revision: &Revision, object: &Value) -> Result<String> {
        let Revision { kind, key, .. } = revision;
        let url = self.kind_url(kind);

        let body = serde_json::to_vec(object).map_err(|source| MeshError::Encode {
            kind: kind.clone(),
            key: key.clone(),
            source,
        })?;

        let response = self.transport.send(Method::POST, &url, Some(body)).await?;

        let checksum = parse_checksum(&response).map_err(|reason| MeshError::Protocol {
            operation: "make",
            kind: kind.clone(),
            key: key.clone(),
            reason,
        })?;

        info!(
            kind = %kind,
            key = %key,
            checksum = %checksum,
            "Configured {}", kind
        );
        self.cache.add(revision.clone(), checksum.clone());

        Ok(checksum)
    }

    /// Create `object` unless it is already cached or already exists remotely.
    ///
    /// The object exists remotely when the response has a `result` key, even
    /// a `null` one. Such an object is not cached, since no write by this
    /// client confirmed its checksum.
    pub async fn get_or_make(
        &self,
        mesh: &str,
        kind: &str,
        key: &str,
        object: &Value,
    ) -> Result<ApplyOutcome> {
        let revision = Revision::parse(mesh, kind, key)?;
        self.get_or_make_revision(&revision, object).await
    }

    async fn get_or_make_revision(
        &self,
        revision: &Revision,
        object: &Value,
    ) -> Result<ApplyOutcome> {
        if self.cache.has(revision) {
            debug!(revision = %revision, "Revision already applied");
            return Ok(ApplyOutcome::Cached);
        }

        let url = self.object_url(&revision.kind, &revision.key);
        let response = self.transport.send(Method::GET, &url, None).await?;

        let document = Document::parse(&response)
            .map_err(|e| protocol_error("get_or_make", &revision.kind, &revision.key, e))?;

        if document.contains("result") {
            debug!(revision = %revision, "Object already exists on control plane");
            return Ok(ApplyOutcome::Existing);
        }

        let checksum = self.make_revision(revision, object).await?;
        Ok(ApplyOutcome::Created(checksum))
    }

    /// Overwrite top-level fields of an existing object.
    ///
    /// Fetches the object, replaces each field named in `changes` wholesale
    /// (adding new ones), and puts the merged object back. Never creates and
    /// never touches the cache.
    pub async fn change(&self, kind: &str, key: &str, changes: Map<String, Value>) -> Result<()> {
        let kind = Kind::parse(kind)?;
        let url = self.object_url(&kind, key);

        let response = self.transport.send(Method::GET, &url, None).await?;

        let mut object = Document::parse(&response)
            .and_then(|document| document.into_field_document("result"))
            .map_err(|e| protocol_error("change", &kind, key, e))?
            .ok_or_else(|| MeshError::NotFound {
                kind: kind.clone(),
                key: key.to_string(),
            })?;

        let fields = changes.len();
        object.merge(changes);

        let updated = object.to_vec().map_err(|source| MeshError::Encode {
            kind: kind.clone(),
            key: key.to_string(),
            source,
        })?;

        self.transport.send(Method::PUT, &url, Some(updated)).await?;

        debug!(kind = %kind, key, fields, "Changed object");
        Ok(())
    }

    /// Run `get_or_make` for every object, continuing past failures
    pub async fn apply_all(&self, objects: &[ObjectSpec]) -> SyncReport {
        let mut report = SyncReport::default();

        for spec in objects {
            let revision = match Revision::parse(&spec.mesh, &spec.kind, &spec.key) {
                Ok(revision) => revision,
                Err(e) => {
                    error!(kind = %spec.kind, key = %spec.key, error = %e, "Rejected object");
                    report.rejected.push((spec.clone(), e));
                    continue;
                }
            };

            match self.get_or_make_revision(&revision, &spec.object).await {
                Ok(outcome) => report.applied.push((revision, outcome)),
                Err(e) => {
                    error!(revision = %revision, error = %e, "Failed to apply object");
                    report.failed.push((revision, e));
                }
            }
        }

        report
    }
}

fn protocol_error(operation: &'static str, kind: &Kind, key: &str, e: ShapeError) -> MeshError {
    MeshError::Protocol {
        operation,
        kind: kind.clone(),
        key: key.to_string(),
        reason: e.to_string(),
    }
}

/// Extract `result.checksum` from a create response
fn parse_checksum(body: &[u8]) -> std::result::Result<String, String> {
    let document = Document::parse(body).map_err(|e| e.to_string())?;
    let checksum = document
        .path(&["result", "checksum"])
        .and_then(|field| field.as_str())
        .map_err(|e| e.to_string())?;

    match checksum {
        Some(checksum) if !checksum.is_empty() => Ok(checksum.to_string()),
        _ => Err(format!(
            "no checksum returned from API, got {}",
            String::from_utf8_lossy(body)
        )),
    }
}
