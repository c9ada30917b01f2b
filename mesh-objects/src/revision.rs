//! Revision keys
//!
//! A [`Revision`] addresses one configuration object on the control plane by
//! `(mesh, kind, key)`. The kind is held in canonical form so that `route`,
//! `Route` and `ROUTE` all name the same cache entry.

use std::fmt;
use std::str::FromStr;

use crate::error::MeshError;

/// Canonical, capitalized object kind (e.g. `Zone`, `Route`, `Cluster`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Kind(String);

impl Kind {
    /// Normalize a producer-supplied kind.
    ///
    /// Every word is lower-cased and then capitalized; words are separated
    /// by `-`, so `cluster-route` becomes `Cluster-Route`. Kinds are used as
    /// a URL path segment and may only contain alphanumerics, `_` and `-`.
    pub fn parse(raw: &str) -> Result<Self, MeshError> {
        let raw = raw.trim();
        if raw.is_empty()
            || !raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(MeshError::InvalidKind(raw.to_string()));
        }

        let mut canonical = String::with_capacity(raw.len());
        let mut word_start = true;
        for c in raw.chars() {
            if c.is_alphanumeric() || c == '_' {
                if word_start {
                    canonical.extend(c.to_uppercase());
                } else {
                    canonical.extend(c.to_lowercase());
                }
                word_start = false;
            } else {
                canonical.push(c);
                word_start = true;
            }
        }

        Ok(Self(canonical))
    }

    /// Canonical form, used for cache keys and log fields
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-case form used in control-plane URLs (`/v1.0/<kind>`)
    pub fn path_segment(&self) -> String {
        self.0.to_lowercase()
    }
}

impl FromStr for Kind {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::parse(s)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one piece of remote configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision {
    /// Mesh the object belongs to
    pub mesh: String,
    /// Canonical object kind
    pub kind: Kind,
    /// Object key within its kind
    pub key: String,
}

impl Revision {
    /// Build a revision from a producer-supplied kind, normalizing it
    pub fn parse(
        mesh: impl Into<String>,
        kind: &str,
        key: impl Into<String>,
    ) -> Result<Self, MeshError> {
        Ok(Self::new(mesh, Kind::parse(kind)?, key))
    }

    pub fn new(mesh: impl Into<String>, kind: Kind, key: impl Into<String>) -> Self {
        Self {
            mesh: mesh.into(),
            kind,
            key: key.into(),
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.mesh, self.kind, self.key)
    }
}
