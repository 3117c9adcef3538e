//! Patch fingerprint
//!
//! The grayscale plane is cut into a fixed 4x4 layout of regions. Region
//! edges sit at `floor(k * height / 4)` and `floor(k * width / 4)`, so when a
//! side is not a multiple of four the regions differ by at most one pixel.
//! Each region contributes one bit (`mean > 127`), packed row-major with the
//! top-left region in the most significant position.

use super::{Fingerprint, Fingerprinter};
use crate::core::error::{DedupError, Result};
use crate::core::pixel::PixelBuffer;

/// Regions per side
const GRID: usize = 4;

/// A region is "bright" when its mean is strictly above this value
const THRESHOLD: f64 = 127.0;

/// 16-bit code sensitive to coarse spatial luminance layout
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchFingerprint;

impl PatchFingerprint {
    /// Per-region grayscale means in row-major region order
    pub fn region_means(buffer: &PixelBuffer) -> Result<[f64; GRID * GRID]> {
        let (height, width) = (buffer.height(), buffer.width());

        if height < GRID || width < GRID {
            return Err(DedupError::InvalidInput(format!(
                "'{}': {}x{} is too small for patch fingerprinting (minimum {}x{})",
                buffer.identity(),
                height,
                width,
                GRID,
                GRID
            )));
        }
        if buffer.channels() != 1 && buffer.channels() != 3 {
            return Err(DedupError::InvalidInput(format!(
                "'{}': unsupported channel count {}",
                buffer.identity(),
                buffer.channels()
            )));
        }

        let gray = buffer.to_grayscale();
        let mut means = [0.0; GRID * GRID];

        for i in 0..GRID {
            let (row_start, row_end) = (i * height / GRID, (i + 1) * height / GRID);
            for j in 0..GRID {
                let (col_start, col_end) = (j * width / GRID, (j + 1) * width / GRID);

                let count = (row_end - row_start) * (col_end - col_start);
                if count == 0 {
                    continue;
                }

                let sum: f64 = (row_start..row_end)
                    .map(|r| gray[r * width + col_start..r * width + col_end].iter().sum::<f64>())
                    .sum();
                means[i * GRID + j] = sum / count as f64;
            }
        }

        Ok(means)
    }
}

impl Fingerprinter for PatchFingerprint {
    fn fingerprint(&self, buffer: &PixelBuffer) -> Result<Fingerprint> {
        let code = Self::region_means(buffer)?
            .iter()
            .fold(0u16, |code, &mean| (code << 1) | u16::from(mean > THRESHOLD));
        Ok(Fingerprint::from(code))
    }

    fn name(&self) -> &'static str {
        "patch"
    }
}
