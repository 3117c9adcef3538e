//! Duplicate Index
//!
//! Maps fingerprints to the ordered list of source identities that share
//! them. A fingerprint with two or more identities is a duplicate group.
//!
//! # Invariants
//!
//! - every stored fingerprint maps to a non-empty list
//! - identities are unique within one list and kept in insertion order
//! - a failed operation leaves the index exactly as it was
//!
//! # Example
//!
//! ```rust
//! use pixel_dedup::core::pixel::PixelBuffer;
//! use pixel_dedup::duplicate::{DuplicateIndex, DuplicatePolicy};
//! use pixel_dedup::fingerprint::Algorithm;
//!
//! let mut index = DuplicateIndex::new(Algorithm::Mean, DuplicatePolicy::Append);
//! let a = PixelBuffer::uniform("a.txt", 4, 4, 7).unwrap();
//! let b = PixelBuffer::uniform("b.txt", 4, 4, 7).unwrap();
//!
//! index.insert("a.txt", &a).unwrap();
//! index.insert("b.txt", &b).unwrap();
//!
//! assert_eq!(index.duplicate_groups()[&7], vec!["a.txt", "b.txt"]);
//! ```

use crate::core::error::{DedupError, Result};
use crate::core::pixel::PixelBuffer;
use crate::duplicate::snapshot;
use crate::fingerprint::{Algorithm, Fingerprint, Fingerprinter};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// What happens when a new identity maps to an occupied fingerprint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Add the identity to the existing group
    #[default]
    Append,
    /// Refuse the insert with `DuplicateKey`
    Reject,
    /// Drop the existing group and keep only the new identity
    Replace,
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicatePolicy::Append => "append",
            DuplicatePolicy::Reject => "reject",
            DuplicatePolicy::Replace => "replace",
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DuplicatePolicy {
    type Err = DedupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "append" => Ok(DuplicatePolicy::Append),
            "reject" => Ok(DuplicatePolicy::Reject),
            "replace" => Ok(DuplicatePolicy::Replace),
            other => Err(DedupError::InvalidInput(format!(
                "unknown duplicate policy '{}' (expected append, reject or replace)",
                other
            ))),
        }
    }
}

/// How an insert changed the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The fingerprint was new
    Created,
    /// The identity joined an existing group
    Appended,
    /// The identity was already stored under this fingerprint
    AlreadyPresent,
    /// The previous group was discarded
    Replaced,
}

/// Statistics about the index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of distinct fingerprints
    pub unique_fingerprints: usize,
    /// Number of stored identities across all fingerprints
    pub total_identities: usize,
    /// Fingerprints shared by two or more identities
    pub duplicate_groups: usize,
    /// Identities beyond the first one in each group
    pub duplicate_identities: usize,
}

/// Fingerprint -> identities map with a fixed algorithm and duplicate policy
#[derive(Debug, Clone)]
pub struct DuplicateIndex<F = Algorithm> {
    algorithm: F,
    policy: DuplicatePolicy,
    entries: BTreeMap<Fingerprint, Vec<String>>,
}

impl<F: Fingerprinter> DuplicateIndex<F> {
    /// Create a new empty index
    pub fn new(algorithm: F, policy: DuplicatePolicy) -> Self {
        Self {
            algorithm,
            policy,
            entries: BTreeMap::new(),
        }
    }

    pub fn algorithm(&self) -> &F {
        &self.algorithm
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Fingerprint `buffer` and file it under `identity`
    pub fn insert(&mut self, identity: impl Into<String>, buffer: &PixelBuffer) -> Result<Fingerprint> {
        self.insert_with_key(identity, None, buffer)
    }

    /// Insert with an optional precomputed key
    ///
    /// `None` computes the fingerprint from `buffer`. `Some(k)` is used as-is,
    /// including `Some(0)`.
    pub fn insert_with_key(
        &mut self,
        identity: impl Into<String>,
        key: Option<Fingerprint>,
        buffer: &PixelBuffer,
    ) -> Result<Fingerprint> {
        let fingerprint = match key {
            Some(k) => k,
            None => self.algorithm.fingerprint(buffer)?,
        };
        self.insert_key(fingerprint, identity)?;
        Ok(fingerprint)
    }

    /// File `identity` under an already known fingerprint
    pub fn insert_key(&mut self, fingerprint: Fingerprint, identity: impl Into<String>) -> Result<InsertOutcome> {
        let identity = identity.into();

        let outcome = match self.entries.get_mut(&fingerprint) {
            None => {
                self.entries.insert(fingerprint, vec![identity.clone()]);
                InsertOutcome::Created
            }
            Some(group) if group.contains(&identity) => InsertOutcome::AlreadyPresent,
            Some(group) => match self.policy {
                DuplicatePolicy::Append => {
                    group.push(identity.clone());
                    InsertOutcome::Appended
                }
                DuplicatePolicy::Reject => {
                    return Err(DedupError::DuplicateKey {
                        fingerprint,
                        identity,
                        existing: group.clone(),
                    });
                }
                DuplicatePolicy::Replace => {
                    *group = vec![identity.clone()];
                    InsertOutcome::Replaced
                }
            },
        };

        debug!(
            "insert {} -> '{}' ({:?}, {})",
            fingerprint,
            identity,
            outcome,
            self.algorithm.name()
        );
        Ok(outcome)
    }

    /// Identities stored under `fingerprint`
    pub fn lookup(&self, fingerprint: Fingerprint) -> Result<&[String]> {
        self.entries
            .get(&fingerprint)
            .map(Vec::as_slice)
            .ok_or(DedupError::NotFound(fingerprint))
    }

    /// Remove a whole fingerprint, or a single identity from it
    ///
    /// Removing an identity that is not in the group is a no-op. The entry
    /// disappears once its last identity is removed.
    pub fn remove(&mut self, fingerprint: Fingerprint, identity: Option<&str>) -> Result<()> {
        let group = self
            .entries
            .get_mut(&fingerprint)
            .ok_or(DedupError::NotFound(fingerprint))?;

        match identity {
            None => {
                self.entries.remove(&fingerprint);
                debug!("removed fingerprint {}", fingerprint);
            }
            Some(identity) => {
                let before = group.len();
                group.retain(|existing| existing != identity);
                if group.len() != before {
                    debug!("removed '{}' from fingerprint {}", identity, fingerprint);
                }
                if group.is_empty() {
                    self.entries.remove(&fingerprint);
                }
            }
        }

        Ok(())
    }

    pub fn contains(&self, fingerprint: Fingerprint) -> bool {
        self.entries.contains_key(&fingerprint)
    }

    /// Number of distinct fingerprints
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of identities across all fingerprints
    pub fn identities(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Fingerprints shared by at least two identities
    pub fn duplicate_groups(&self) -> BTreeMap<Fingerprint, Vec<String>> {
        self.entries
            .iter()
            .filter(|(_, group)| group.len() >= 2)
            .map(|(fp, group)| (*fp, group.clone()))
            .collect()
    }

    /// Fingerprint under which `identity` is stored, if any
    pub fn find_identity(&self, identity: &str) -> Option<Fingerprint> {
        self.entries
            .iter()
            .find(|(_, group)| group.iter().any(|id| id == identity))
            .map(|(fp, _)| *fp)
    }

    /// Entries in ascending fingerprint order
    pub fn iter(&self) -> impl Iterator<Item = (Fingerprint, &[String])> {
        self.entries.iter().map(|(fp, group)| (*fp, group.as_slice()))
    }

    pub fn entries(&self) -> &BTreeMap<Fingerprint, Vec<String>> {
        &self.entries
    }

    /// Empty the index; the algorithm and policy stay bound
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            unique_fingerprints: self.entries.len(),
            ..IndexStats::default()
        };

        for group in self.entries.values() {
            stats.total_identities += group.len();
            if group.len() > 1 {
                stats.duplicate_groups += 1;
                stats.duplicate_identities += group.len() - 1;
            }
        }

        stats
    }

    /// Replace the whole entry set; callers must pass validated entries
    fn replace_entries(&mut self, entries: BTreeMap<Fingerprint, Vec<String>>) {
        self.entries = entries;
    }

    /// Write the index to a snapshot file
    pub fn save_snapshot(&self, path: &Path) -> Result<PathBuf> {
        let saved = snapshot::save(&self.entries, path)?;
        info!(
            "Saved {} fingerprints ({} identities) to {}",
            self.len(),
            self.identities(),
            saved.display()
        );
        Ok(saved)
    }

    /// Replace the index contents with a snapshot file
    pub fn load_snapshot(&mut self, path: &Path) -> Result<()> {
        let entries = snapshot::load(path)?;
        self.replace_entries(entries);
        info!(
            "Loaded {} fingerprints ({} identities) from {}",
            self.len(),
            self.identities(),
            path.display()
        );
        Ok(())
    }
}

impl Default for DuplicateIndex<Algorithm> {
    fn default() -> Self {
        Self::new(Algorithm::default(), DuplicatePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Fingerprints every buffer to a fixed value
    struct Constant(Fingerprint);

    impl Fingerprinter for Constant {
        fn fingerprint(&self, _buffer: &PixelBuffer) -> Result<Fingerprint> {
            Ok(self.0)
        }

        fn name(&self) -> &'static str {
            "constant"
        }
    }

    fn buffer(identity: &str, value: u8) -> PixelBuffer {
        PixelBuffer::uniform(identity, 4, 4, value).unwrap()
    }

    #[test]
    fn test_empty_index() {
        let index: DuplicateIndex = DuplicateIndex::default();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert_eq!(index.stats(), IndexStats::default());
        assert_eq!(index.policy(), DuplicatePolicy::Append);
    }

    #[test]
    fn test_append_builds_duplicate_group() {
        let mut index = DuplicateIndex::new(Constant(7), DuplicatePolicy::Append);
        assert_eq!(index.insert("x.jpg", &buffer("x.jpg", 1)).unwrap(), 7);
        assert_eq!(index.insert("y.jpg", &buffer("y.jpg", 2)).unwrap(), 7);

        let groups = index.duplicate_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[&7], vec!["x.jpg", "y.jpg"]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.identities(), 2);
    }

    #[test]
    fn test_reinsert_same_identity_is_noop() {
        for policy in [DuplicatePolicy::Append, DuplicatePolicy::Reject, DuplicatePolicy::Replace] {
            let mut index = DuplicateIndex::new(Constant(3), policy);
            index.insert("a.png", &buffer("a.png", 0)).unwrap();
            index.insert("a.png", &buffer("a.png", 0)).unwrap();
            assert_eq!(index.lookup(3).unwrap(), ["a.png"]);
            assert_eq!(
                index.insert_key(3, "a.png").unwrap(),
                InsertOutcome::AlreadyPresent
            );
        }
    }

    #[test]
    fn test_reject_policy_leaves_entry_unchanged() {
        let mut index = DuplicateIndex::new(Constant(7), DuplicatePolicy::Reject);
        index.insert("x.jpg", &buffer("x.jpg", 1)).unwrap();

        let err = index.insert("y.jpg", &buffer("y.jpg", 2)).unwrap_err();
        match err {
            DedupError::DuplicateKey {
                fingerprint,
                identity,
                existing,
            } => {
                assert_eq!(fingerprint, 7);
                assert_eq!(identity, "y.jpg");
                assert_eq!(existing, vec!["x.jpg"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert_eq!(index.lookup(7).unwrap(), ["x.jpg"]);
        assert!(index.duplicate_groups().is_empty());
    }

    #[test]
    fn test_replace_policy_keeps_only_newest() {
        let mut index = DuplicateIndex::new(Constant(9), DuplicatePolicy::Replace);
        index.insert("a.jpg", &buffer("a.jpg", 0)).unwrap();
        index.insert("b.jpg", &buffer("b.jpg", 0)).unwrap();
        assert_eq!(index.insert_key(9, "c.jpg").unwrap(), InsertOutcome::Replaced);
        assert_eq!(index.lookup(9).unwrap(), ["c.jpg"]);
    }

    #[test]
    fn test_explicit_zero_key_is_not_auto() {
        // Mean of a 200-valued buffer is 200, but the caller insists on 0
        let mut index = DuplicateIndex::new(Algorithm::Mean, DuplicatePolicy::Append);
        let fp = index
            .insert_with_key("black.txt", Some(0), &buffer("black.txt", 200))
            .unwrap();
        assert_eq!(fp, 0);
        assert!(index.contains(0));
        assert!(!index.contains(200));

        let fp = index.insert_with_key("auto.txt", None, &buffer("auto.txt", 200)).unwrap();
        assert_eq!(fp, 200);
    }

    #[test]
    fn test_all_black_patch_images_share_key_zero() {
        let mut index = DuplicateIndex::new(Algorithm::Patch, DuplicatePolicy::Append);
        index.insert("a.png", &buffer("a.png", 0)).unwrap();
        index.insert("b.txt", &buffer("b.txt", 10)).unwrap();
        assert_eq!(index.lookup(0).unwrap(), ["a.png", "b.txt"]);
    }

    #[test]
    fn test_invalid_buffer_leaves_index_untouched() {
        let mut index = DuplicateIndex::new(Algorithm::Patch, DuplicatePolicy::Append);
        let tiny = PixelBuffer::uniform("tiny", 2, 2, 0).unwrap();
        assert!(matches!(
            index.insert("tiny", &tiny),
            Err(DedupError::InvalidInput(_))
        ));
        assert!(index.is_empty());
    }

    #[test]
    fn test_lookup_missing() {
        let index: DuplicateIndex = DuplicateIndex::default();
        assert!(matches!(index.lookup(42), Err(DedupError::NotFound(42))));
    }

    #[test]
    fn test_remove_whole_entry_and_single_identity() {
        let mut index = DuplicateIndex::new(Constant(5), DuplicatePolicy::Append);
        index.insert_key(5, "a").unwrap();
        index.insert_key(5, "b").unwrap();
        index.insert_key(6, "c").unwrap();

        index.remove(5, Some("a")).unwrap();
        assert_eq!(index.lookup(5).unwrap(), ["b"]);

        index.remove(5, Some("b")).unwrap();
        assert!(!index.contains(5));

        index.remove(6, None).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_remove_missing() {
        let mut index = DuplicateIndex::new(Constant(1), DuplicatePolicy::Append);
        assert!(matches!(index.remove(1, None), Err(DedupError::NotFound(1))));

        index.insert_key(1, "present.jpg").unwrap();
        index.remove(1, Some("missing.jpg")).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup(1).unwrap(), ["present.jpg"]);
    }

    #[test]
    fn test_clear_keeps_algorithm() {
        let mut index = DuplicateIndex::new(Algorithm::Mean, DuplicatePolicy::Reject);
        index.insert("a", &buffer("a", 10)).unwrap();
        index.clear();
        assert!(index.is_empty());
        assert_eq!(*index.algorithm(), Algorithm::Mean);
        assert_eq!(index.policy(), DuplicatePolicy::Reject);
        assert_eq!(index.insert("b", &buffer("b", 11)).unwrap(), 11);
    }

    #[test]
    fn test_stats_and_find_identity() {
        let mut index = DuplicateIndex::new(Constant(0), DuplicatePolicy::Append);
        for (fp, id) in [(1, "a"), (1, "b"), (1, "c"), (2, "d"), (3, "e"), (3, "f")] {
            index.insert_key(fp, id).unwrap();
        }

        let stats = index.stats();
        assert_eq!(stats.unique_fingerprints, 3);
        assert_eq!(stats.total_identities, 6);
        assert_eq!(stats.duplicate_groups, 2);
        assert_eq!(stats.duplicate_identities, 3);

        assert_eq!(index.find_identity("e"), Some(3));
        assert_eq!(index.find_identity("z"), None);

        let keys: Vec<_> = index.iter().map(|(fp, _)| fp).collect();
        assert_eq!(keys, vec![1, 2, 3]);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("Reject".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Reject);
        assert_eq!("replace".parse::<DuplicatePolicy>().unwrap(), DuplicatePolicy::Replace);
        assert!("skip".parse::<DuplicatePolicy>().is_err());
    }

    #[test]
    fn test_snapshot_round_trip_through_index() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("table.json");

        let mut index = DuplicateIndex::new(Constant(0), DuplicatePolicy::Append);
        index.insert_key(43520, "a.jpg").unwrap();
        index.insert_key(7, "b.txt").unwrap();
        index.insert_key(7, "c.jpg").unwrap();
        index.save_snapshot(&path).unwrap();

        let mut restored = DuplicateIndex::new(Constant(0), DuplicatePolicy::Append);
        restored.insert_key(99, "stale.png").unwrap();
        restored.load_snapshot(&path).unwrap();

        assert_eq!(restored.duplicate_groups(), index.duplicate_groups());
        assert_eq!(restored.entries(), index.entries());
        assert!(!restored.contains(99));
    }

    #[test]
    fn test_invalid_snapshot_leaves_index_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("table.json");
        std::fs::write(&path, r#"{"7": [], "8": ["a.jpg", "a.jpg"]}"#).unwrap();

        let mut index = DuplicateIndex::new(Constant(0), DuplicatePolicy::Append);
        index.insert_key(1, "kept.png").unwrap();

        let err = index.load_snapshot(&path).unwrap_err();
        assert!(matches!(err, DedupError::FormatError { .. }));
        assert_eq!(index.lookup(1).unwrap(), ["kept.png"]);
        assert!(index.iter().all(|(_, group)| !group.is_empty()));
        assert_eq!(index.len(), 1);
    }
}
