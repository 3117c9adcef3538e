//! Mean fingerprint
//!
//! Arithmetic mean over every sample of every channel, rounded half to even.
//! Cheap and collision-prone; useful as a weak baseline next to the patch code.

use super::{Fingerprint, Fingerprinter};
use crate::core::error::{DedupError, Result};
use crate::core::pixel::PixelBuffer;

/// Coarse intensity code in `0..=255`
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanFingerprint;

impl Fingerprinter for MeanFingerprint {
    fn fingerprint(&self, buffer: &PixelBuffer) -> Result<Fingerprint> {
        let samples = buffer.samples();
        if samples.is_empty() {
            return Err(DedupError::InvalidInput(format!(
                "'{}': cannot fingerprint an empty buffer",
                buffer.identity()
            )));
        }

        let sum: u64 = samples.iter().map(|&v| u64::from(v)).sum();
        let mean = sum as f64 / samples.len() as f64;

        Ok(mean.round_ties_even().clamp(0.0, 255.0) as Fingerprint)
    }

    fn name(&self) -> &'static str {
        "mean"
    }
}
