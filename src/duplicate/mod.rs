//! Duplicate detection module
//!
//! This module stores fingerprints and reports which sources share them.
//!
//! # Submodules
//!
//! - `index` - Fingerprint index with duplicate policies
//! - `snapshot` - JSON persistence of the index
//! - `scanner` - Folder walking and bulk indexing

pub mod index;
pub mod scanner;
pub mod snapshot;

pub use index::{DuplicateIndex, DuplicatePolicy, IndexStats, InsertOutcome};
pub use scanner::{build_index, collect_files, ScanOptions, ScanProgress, ScanReport};
