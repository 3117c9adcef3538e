//! Snapshot persistence for the duplicate index
//!
//! A snapshot is a flat JSON object. Keys are fingerprints written as
//! canonical base-10 strings, values are the identity lists in insertion
//! order:
//!
//! ```json
//! {"7": ["b.txt", "c.jpg"], "43520": ["a.jpg"]}
//! ```
//!
//! Keys are written in ascending numeric order. Loading accepts any order
//! but validates the shape strictly, so a loaded entry set always satisfies
//! the index invariants (non-empty lists, no repeated identity in a list).

use crate::core::error::{DedupError, Result};
use crate::fingerprint::Fingerprint;
use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Fingerprint -> identities, as stored by the index
pub type Entries = BTreeMap<Fingerprint, Vec<String>>;

/// Serializes entries with string keys in numeric order
struct Ordered<'a>(&'a Entries);

impl Serialize for Ordered<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (fingerprint, identities) in self.0 {
            map.serialize_entry(&fingerprint.to_string(), identities)?;
        }
        map.end()
    }
}

/// Top-level object as (key, value) pairs in document order
///
/// `serde_json::Map` keeps only the last of repeated keys, so the object is
/// walked by hand and a repeated key is an error.
struct RawDocument(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for RawDocument {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = RawDocument;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping fingerprints to identity lists")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<RawDocument, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut seen = HashSet::new();
                let mut pairs = Vec::new();
                while let Some(key) = map.next_key::<String>()? {
                    if !seen.insert(key.clone()) {
                        return Err(de::Error::custom(format!(
                            "key '{}' appears more than once",
                            key
                        )));
                    }
                    let value = map.next_value::<serde_json::Value>()?;
                    pairs.push((key, value));
                }
                Ok(RawDocument(pairs))
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

/// Render entries as a snapshot document
pub fn encode(entries: &Entries) -> Result<String> {
    serde_json::to_string_pretty(&Ordered(entries))
        .map_err(|e| DedupError::format(PathBuf::new(), format!("failed to serialize snapshot: {}", e)))
}

/// Parse a snapshot document; `origin` is only used in error messages
pub fn decode(text: &str, origin: &Path) -> Result<Entries> {
    let RawDocument(pairs) = serde_json::from_str::<RawDocument>(text)
        .map_err(|e| DedupError::format(origin, format!("invalid snapshot: {}", e)))?;

    let mut entries = Entries::new();
    for (key, value) in pairs {
        let fingerprint = parse_key(&key).ok_or_else(|| {
            DedupError::format(origin, format!("key '{}' is not a valid fingerprint", key))
        })?;

        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(DedupError::format(
                    origin,
                    format!("value for key '{}' must be a list, found {}", key, kind(&other)),
                ))
            }
        };

        if items.is_empty() {
            return Err(DedupError::format(
                origin,
                format!("key '{}' has an empty identity list", key),
            ));
        }

        let mut seen = HashSet::new();
        let mut identities = Vec::with_capacity(items.len());
        for item in items {
            let identity = match item {
                Value::String(s) => s,
                other => {
                    return Err(DedupError::format(
                        origin,
                        format!("key '{}' contains a non-string identity ({})", key, kind(&other)),
                    ))
                }
            };
            if !seen.insert(identity.clone()) {
                return Err(DedupError::format(
                    origin,
                    format!("key '{}' lists '{}' more than once", key, identity),
                ));
            }
            identities.push(identity);
        }

        entries.insert(fingerprint, identities);
    }

    Ok(entries)
}

/// Write `entries` to `path`, creating missing parent directories
pub fn save(entries: &Entries, path: &Path) -> Result<PathBuf> {
    let json = encode(entries)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| DedupError::io(parent, e))?;
        }
    }

    fs::write(path, json).map_err(|e| DedupError::io(path, e))?;

    Ok(path.to_path_buf())
}

/// Read and validate the snapshot at `path`
pub fn load(path: &Path) -> Result<Entries> {
    let text = fs::read_to_string(path).map_err(|e| DedupError::io(path, e))?;
    decode(&text, path)
}

/// Canonical decimal: digits only, no sign, no leading zero except "0"
fn parse_key(key: &str) -> Option<Fingerprint> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse().ok()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
