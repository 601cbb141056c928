//! Hashing System - SHA-256 Artifact Manifest
//!
//! Canonical hashes over the emitted artifact set so byte-stability can be
//! audited without diffing the files themselves.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex_encode(hasher.finalize())
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    let sorted = sort_value(&v);
    to_string(&sorted)
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let sorted_map: serde_json::Map<String, Value> = sorted
                .into_iter()
                .map(|(k, v)| (k.clone(), sort_value(v)))
                .collect();
            Value::Object(sorted_map)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_value).collect()),
        _ => v.clone(),
    }
}

/// Per-run digest of every emitted artifact.
///
/// `bundle_hash` covers the artifact map itself, so any content change in
/// any file changes the bundle hash.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtifactManifest {
    pub artifacts: BTreeMap<String, String>,
    pub bundle_hash: String,
}

impl ArtifactManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one artifact by file name and content.
    pub fn record(&mut self, name: &str, content: &str) {
        self.artifacts
            .insert(name.to_string(), sha256_hex(content.as_bytes()));
    }

    /// Seal the manifest and return its canonical serialized form.
    pub fn finalize(mut self) -> Result<(String, Self), serde_json::Error> {
        let canonical = canonical_json(&self.artifacts)?;
        self.bundle_hash = sha256_hex(canonical.as_bytes());
        let rendered = format!("{}\n", canonical_json(&self)?);
        Ok((rendered, self))
    }
}

fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": 3});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":2,"m":3,"z":1}"#);
    }

    #[test]
    fn test_hash_deterministic() {
        let data = b"test data";
        assert_eq!(sha256_hex(data), sha256_hex(data));
    }

    #[test]
    fn test_manifest_hash_tracks_content() {
        let mut a = ArtifactManifest::new();
        a.record("documents.yml", "one");
        a.record("printer.yml", "two");
        let (_, a) = a.finalize().unwrap();

        let mut b = ArtifactManifest::new();
        b.record("printer.yml", "two");
        b.record("documents.yml", "one");
        let (_, b) = b.finalize().unwrap();
        assert_eq!(a.bundle_hash, b.bundle_hash);

        let mut c = ArtifactManifest::new();
        c.record("documents.yml", "changed");
        c.record("printer.yml", "two");
        let (_, c) = c.finalize().unwrap();
        assert_ne!(a.bundle_hash, c.bundle_hash);
    }
}
