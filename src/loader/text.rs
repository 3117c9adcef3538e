//! Textual pixel-array format
//!
//! Whitespace-separated numbers. The first three are the height `M`, width
//! `N` and channel count `K`; exactly `M * N * K` samples follow in
//! row-major order. Line breaks carry no meaning. Integral floats such as
//! `12.0` are accepted for both header and samples.

use super::{identity_of, LoadError};
use crate::core::pixel::PixelBuffer;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Samples written per line by [`save`]
const VALUES_PER_LINE: usize = 10;

/// Read a text pixel file
pub fn load(path: &Path) -> Result<PixelBuffer, LoadError> {
    let content = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    parse(&content, path)
}

/// Parse text pixel content; `path` becomes the buffer identity
pub fn parse(content: &str, path: &Path) -> Result<PixelBuffer, LoadError> {
    let mut tokens = content.split_whitespace();

    let mut header = [0usize; 3];
    for (slot, name) in header.iter_mut().zip(["height", "width", "channels"]) {
        let token = tokens
            .next()
            .ok_or_else(|| LoadError::corrupt(path, format!("missing {} in header", name)))?;
        *slot = parse_integral(token)
            .filter(|&v| v > 0.0 && v <= usize::MAX as f64)
            .map(|v| v as usize)
            .ok_or_else(|| LoadError::corrupt(path, format!("invalid {} '{}'", name, token)))?;
    }
    let [height, width, channels] = header;

    if channels != 1 && channels != 3 {
        return Err(LoadError::UnsupportedChannels {
            path: path.to_path_buf(),
            channels,
        });
    }

    let expected = height
        .checked_mul(width)
        .and_then(|v| v.checked_mul(channels))
        .ok_or_else(|| LoadError::corrupt(path, "declared dimensions overflow"))?;

    let mut samples = Vec::new();
    for token in tokens {
        let value = parse_integral(token)
            .filter(|v| (0.0..=255.0).contains(v))
            .ok_or_else(|| {
                LoadError::corrupt(path, format!("sample '{}' is not an integer in 0..=255", token))
            })?;
        samples.push(value as u8);
    }

    if samples.len() != expected {
        return Err(LoadError::DimensionMismatch {
            path: path.to_path_buf(),
            expected,
            actual: samples.len(),
        });
    }

    PixelBuffer::new(identity_of(path), height, width, channels, samples)
        .map_err(|e| LoadError::corrupt(path, e.to_string()))
}

/// Render a buffer in the text format
pub fn render(buffer: &PixelBuffer) -> String {
    let mut out = format!(
        "{} {} {}\n",
        buffer.height(),
        buffer.width(),
        buffer.channels()
    );
    for chunk in buffer.samples().chunks(VALUES_PER_LINE) {
        let line: Vec<String> = chunk.iter().map(|v| v.to_string()).collect();
        let _ = writeln!(out, "{}", line.join(" "));
    }
    out
}

/// Write a buffer to `path` in the text format
pub fn save(buffer: &PixelBuffer, path: &Path) -> Result<(), LoadError> {
    fs::write(path, render(buffer)).map_err(|e| LoadError::io(path, e))
}

fn parse_integral(token: &str) -> Option<f64> {
    let value: f64 = token.parse().ok()?;
    (value.is_finite() && value.fract() == 0.0).then_some(value)
}
