//! Fingerprint algorithms
//!
//! A fingerprint is a small integer computed deterministically from a
//! [`PixelBuffer`]. Two buffers with the same fingerprint are treated as
//! duplicates by the index, so the algorithm decides what "duplicate" means:
//!
//! - [`PatchFingerprint`] - 16-bit code from a 4x4 grid of binarized region means
//! - [`MeanFingerprint`] - rounded mean intensity in `0..=255`
//!
//! Equal fingerprints do not imply equal pixels; different images can collide.

pub mod mean;
pub mod patch;

pub use mean::MeanFingerprint;
pub use patch::PatchFingerprint;

use crate::core::error::{DedupError, Result};
use crate::core::pixel::PixelBuffer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Integer fingerprint value
pub type Fingerprint = u32;

/// Capability shared by all fingerprint algorithms
pub trait Fingerprinter {
    /// Compute the fingerprint of `buffer`
    fn fingerprint(&self, buffer: &PixelBuffer) -> Result<Fingerprint>;

    /// Short name used in logs and reports
    fn name(&self) -> &'static str;
}

/// Selects one of the built-in algorithms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Binarized 4x4 patch means
    #[default]
    Patch,
    /// Rounded mean intensity
    Mean,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::Patch, Algorithm::Mean];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Patch => "patch",
            Algorithm::Mean => "mean",
        }
    }
}

impl Fingerprinter for Algorithm {
    fn fingerprint(&self, buffer: &PixelBuffer) -> Result<Fingerprint> {
        match self {
            Algorithm::Patch => PatchFingerprint.fingerprint(buffer),
            Algorithm::Mean => MeanFingerprint.fingerprint(buffer),
        }
    }

    fn name(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = DedupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "patch" => Ok(Algorithm::Patch),
            "mean" => Ok(Algorithm::Mean),
            other => Err(DedupError::InvalidInput(format!(
                "unknown fingerprint algorithm '{}' (expected 'patch' or 'mean')",
                other
            ))),
        }
    }
}
