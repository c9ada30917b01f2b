//! Idempotency cache
//!
//! Remembers the checksum of every revision this process has successfully
//! written, so repeated reconciliation passes can skip the control plane.
//! Entries live for the life of the process; there is no eviction.

use dashmap::DashMap;
use tracing::debug;

use crate::revision::Revision;

/// Thread-safe map from revision to last applied checksum
///
/// Shared between callers as `Arc<RevisionCache>`. Reads and writes to
/// distinct revisions never contend on the same shard lock for long; a read
/// racing a write to the same revision may see either state.
#[derive(Debug, Default)]
pub struct RevisionCache {
    checksums: DashMap<Revision, String>,
}

impl RevisionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            checksums: DashMap::new(),
        }
    }

    /// Record the checksum returned for a confirmed remote write.
    ///
    /// Returns the previously recorded checksum, if any.
    pub fn add(&self, revision: Revision, checksum: impl Into<String>) -> Option<String> {
        let checksum = checksum.into();
        debug!(revision = %revision, checksum = %checksum, "Caching revision");
        self.checksums.insert(revision, checksum)
    }

    /// Check whether a revision is known to be applied
    pub fn has(&self, revision: &Revision) -> bool {
        self.checksums.contains_key(revision)
    }

    /// Get the checksum recorded for a revision
    pub fn get(&self, revision: &Revision) -> Option<String> {
        self.checksums.get(revision).map(|entry| entry.value().clone())
    }

    /// Number of cached revisions
    pub fn len(&self) -> usize {
        self.checksums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checksums.is_empty()
    }

    /// All cached revisions belonging to one mesh, sorted by kind then key
    pub fn revisions_in(&self, mesh: &str) -> Vec<Revision> {
        let mut revisions: Vec<Revision> = self
            .checksums
            .iter()
            .filter(|entry| entry.key().mesh == mesh)
            .map(|entry| entry.key().clone())
            .collect();
        revisions.sort_by(|a, b| (&a.kind, &a.key).cmp(&(&b.kind, &b.key)));
        revisions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::Kind;
    use std::sync::Arc;

    fn revision(mesh: &str, kind: &str, key: &str) -> Revision {
        Revision::new(mesh, Kind::parse(kind).unwrap(), key)
    }

    #[test]
    fn test_add_and_get() {
        let cache = RevisionCache::new();
        assert!(cache.is_empty());

        let previous = cache.add(revision("mesh", "zone", "default"), "abc123");
        assert!(previous.is_none());

        assert!(cache.has(&revision("mesh", "zone", "default")));
        assert_eq!(
            cache.get(&revision("mesh", "Zone", "default")).as_deref(),
            Some("abc123")
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_overwrite_returns_previous() {
        let cache = RevisionCache::new();
        cache.add(revision("mesh", "route", "edge"), "v1");
        let previous = cache.add(revision("mesh", "ROUTE", "edge"), "v2");

        assert_eq!(previous.as_deref(), Some("v1"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&revision("mesh", "route", "edge")).as_deref(), Some("v2"));
    }

    #[test]
    fn test_meshes_are_isolated() {
        let cache = RevisionCache::new();
        cache.add(revision("mesh-a", "cluster", "edge"), "a");

        assert!(!cache.has(&revision("mesh-b", "cluster", "edge")));
    }

    #[test]
    fn test_revisions_in_mesh() {
        let cache = RevisionCache::new();
        cache.add(revision("mesh-a", "route", "b"), "1");
        cache.add(revision("mesh-a", "cluster", "z"), "2");
        cache.add(revision("mesh-a", "route", "a"), "3");
        cache.add(revision("mesh-b", "route", "a"), "4");

        let listed: Vec<String> = cache
            .revisions_in("mesh-a")
            .iter()
            .map(|r| r.to_string())
            .collect();
        assert_eq!(
            listed,
            vec!["mesh-a/Cluster/z", "mesh-a/Route/a", "mesh-a/Route/b"]
        );
    }

    #[test]
    fn test_concurrent_writers() {
        let cache = Arc::new(RevisionCache::new());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        cache.add(revision("mesh", "listener", &format!("{}-{}", t, i)), "sum");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 400);
    }
}
