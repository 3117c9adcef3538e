//! Pixel Dedup Library
//!
//! Finds pixel-content duplicates among raster images and text pixel-array
//! files. Each file is reduced to a small integer fingerprint and filed in an
//! index keyed by that fingerprint; files that share a fingerprint form a
//! duplicate group.
//!
//! # Architecture
//!
//! - [`core`] - Configuration, error types and the [`PixelBuffer`](core::pixel::PixelBuffer)
//! - [`fingerprint`] - The patch and mean fingerprint algorithms
//! - [`duplicate`] - Duplicate index, snapshot persistence and folder scanning
//! - [`loader`] - PNG/JPEG and text pixel-array loaders
//! - [`cli`] - Command-line interface (only used by the binary)
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use pixel_dedup::duplicate::{build_index, DuplicateIndex, DuplicatePolicy, ScanOptions};
//! use pixel_dedup::fingerprint::Algorithm;
//! use std::path::{Path, PathBuf};
//! use std::sync::atomic::AtomicBool;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut index = DuplicateIndex::new(Algorithm::Patch, DuplicatePolicy::Append);
//!     let shutdown = AtomicBool::new(false);
//!
//!     build_index(
//!         &mut index,
//!         &[PathBuf::from("./dataset")],
//!         &ScanOptions::default(),
//!         &shutdown,
//!         |_| {},
//!     )?;
//!
//!     for (fingerprint, files) in index.duplicate_groups() {
//!         println!("{}: {:?}", fingerprint, files);
//!     }
//!
//!     index.save_snapshot(Path::new("./output/hash_table.json"))?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod duplicate;
pub mod fingerprint;
pub mod loader;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
