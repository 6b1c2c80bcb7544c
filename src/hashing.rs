//! Fingerprints - SHA-256 over export bytes and layouts
//!
//! Two exports of the same layout carry the same layout fingerprint even
//! though their identifiers and timestamps differ.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::layout::LabelLayout;

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// JSON with object keys sorted at every level, no whitespace.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    serde_json::to_string(&sorted(value))
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}

pub fn layout_fingerprint(layout: &LabelLayout) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(layout)?.as_bytes()))
}
