//! Idempotent synchronization client for the mesh control-plane API
//!
//! Pushes declarative configuration objects (zones, clusters, routes, ...)
//! to the control plane and remembers which revisions were already applied,
//! so repeated reconciliation passes do not re-submit them.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mesh_objects::{ClientConfig, RevisionCache, SyncClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // One cache per process, shared by every client
//! let cache = Arc::new(RevisionCache::new());
//! let client = SyncClient::new(ClientConfig::from_env(), cache)?;
//!
//! // Wait for the control plane to come up
//! client.ping().await?;
//!
//! // Create if missing; repeated calls are cache hits
//! let zone = serde_json::json!({"zone_key": "default", "name": "default"});
//! client.get_or_make("mesh-sample", "zone", "default", &zone).await?;
//!
//! // Patch top-level fields of a live object
//! let mut changes = serde_json::Map::new();
//! changes.insert("active_proxy_filters".into(), serde_json::json!(["gm.metrics"]));
//! client.change("proxy", "edge", changes).await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod document;
pub mod error;
pub mod mock;
pub mod revision;
pub mod transport;
pub mod types;

// Re-export main types
pub use cache::RevisionCache;
pub use client::SyncClient;
pub use document::{Document, Field, ShapeError};
pub use error::{MeshError, Result, TransportError};
pub use mock::{MockTransport, RecordedRequest};
pub use revision::{Kind, Revision};
pub use transport::{HttpTransport, Transport, DEFAULT_TIMEOUT};
pub use types::*;
