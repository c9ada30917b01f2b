//! Manifest and change-set files

use std::path::Path;

use anyhow::Context;
use mesh_objects::{ChangeSpec, ObjectSpec};
use serde::Deserialize;

/// Objects to apply, as produced by the object builder
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub objects: Vec<ObjectSpec>,
}

impl Manifest {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing manifest {}", path.display()))
    }
}

/// Read a change-set file
pub fn load_change_spec(path: &Path) -> anyhow::Result<ChangeSpec> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading change-set {}", path.display()))?;
    parse_change_spec(&raw).with_context(|| format!("parsing change-set {}", path.display()))
}

pub fn parse_change_spec(raw: &str) -> anyhow::Result<ChangeSpec> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_parsing() {
        let manifest = Manifest::from_json(
            r#"{
                "objects": [
                    {"mesh": "mesh-sample", "kind": "zone", "key": "default",
                     "object": {"zone_key": "default", "name": "default"}},
                    {"mesh": "mesh-sample", "kind": "domain", "key": "edge",
                     "object": {"domain_key": "edge", "zone_key": "default", "port": 10808}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.objects.len(), 2);
        assert_eq!(manifest.objects[1].kind, "domain");
        assert_eq!(manifest.objects[1].object["port"], 10808);
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = Manifest::from_json("{}").unwrap();
        assert!(manifest.objects.is_empty());
    }

    #[test]
    fn test_change_spec_parsing() {
        let spec = parse_change_spec(
            r#"{"kind": "proxy", "key": "edge", "changes": {"active_filters": ["gm.metrics"]}}"#,
        )
        .unwrap();
        assert_eq!(spec.kind, "proxy");
        assert_eq!(spec.changes.len(), 1);

        // changes must be an object of field -> value
        assert!(parse_change_spec(r#"{"kind": "proxy", "key": "edge", "changes": [1]}"#).is_err());
        assert!(parse_change_spec("not json").is_err());
    }
}
