//! Normalized in-memory pixel grid
//!
//! Every loader produces a [`PixelBuffer`]: a row-major grid of 8-bit
//! samples with one or three channels and the identity of the source it
//! was read from. Buffers are validated on construction and immutable
//! afterwards.

use crate::core::error::{DedupError, Result};

/// Row-major pixel grid plus the identity of its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    identity: String,
    height: usize,
    width: usize,
    channels: usize,
    samples: Vec<u8>,
}

impl PixelBuffer {
    /// Build a buffer, checking dimensions, channel count and sample count
    pub fn new(
        identity: impl Into<String>,
        height: usize,
        width: usize,
        channels: usize,
        samples: Vec<u8>,
    ) -> Result<Self> {
        let identity = identity.into();

        if height == 0 || width == 0 {
            return Err(DedupError::InvalidInput(format!(
                "'{}': dimensions must be positive, got {}x{}",
                identity, height, width
            )));
        }

        if channels != 1 && channels != 3 {
            return Err(DedupError::InvalidInput(format!(
                "'{}': unsupported channel count {} (expected 1 or 3)",
                identity, channels
            )));
        }

        let expected = height * width * channels;
        if samples.len() != expected {
            return Err(DedupError::InvalidInput(format!(
                "'{}': expected {} samples for {}x{}x{}, got {}",
                identity,
                expected,
                height,
                width,
                channels,
                samples.len()
            )));
        }

        Ok(Self {
            identity,
            height,
            width,
            channels,
            samples,
        })
    }

    /// Single-channel buffer filled with one value
    pub fn uniform(identity: impl Into<String>, height: usize, width: usize, value: u8) -> Result<Self> {
        Self::new(identity, height, width, 1, vec![value; height * width])
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Number of pixels (not samples)
    pub fn len(&self) -> usize {
        self.height * self.width
    }

    /// True when the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Channel values of the pixel at `(row, col)`
    pub fn pixel(&self, row: usize, col: usize) -> Option<&[u8]> {
        if row >= self.height || col >= self.width {
            return None;
        }
        let start = (row * self.width + col) * self.channels;
        Some(&self.samples[start..start + self.channels])
    }

    /// Unweighted channel mean of the pixel at `(row, col)`
    pub fn gray(&self, row: usize, col: usize) -> Option<f64> {
        self.pixel(row, col).map(gray_of)
    }

    /// Grayscale plane in row-major order
    pub fn to_grayscale(&self) -> Vec<f64> {
        self.samples
            .chunks_exact(self.channels)
            .map(gray_of)
            .collect()
    }
}

fn gray_of(pixel: &[u8]) -> f64 {
    match pixel {
        [v] => f64::from(*v),
        _ => pixel.iter().map(|&v| f64::from(v)).sum::<f64>() / pixel.len() as f64,
    }
}
